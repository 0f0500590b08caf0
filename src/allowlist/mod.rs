//! Dependency allow-list: loading, matching, and near-name suggestions.
//!
//! The allow-list document is JSON with top-level categories. Each category
//! maps either to a list of names, or to sub-categories that are themselves
//! a name→metadata mapping or a list of names:
//!
//! ```json
//! {
//!   "frontend": { "framework": { "react": "18.x" }, "state": ["redux"] },
//!   "backend": ["fastapi"],
//!   "deployment": { "platform": "fly.io" }
//! }
//! ```
//!
//! All leaf names are flattened into one approved set regardless of category.
//! A sub-category whose value is a scalar (`"platform": "fly.io"`) declares
//! its own key as the approved name.

pub mod builtins;
pub mod imports;

pub use builtins::Ecosystem;
pub use imports::{DeclaredDependency, DependencyValidator};

use crate::core::{Severity, Violation, ViolationKind};
use crate::errors::{ComplianceError, Result};
use crate::io::FileSystem;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Categories a complete allow-list is expected to declare.
pub const EXPECTED_CATEGORIES: &[&str] = &["frontend", "backend", "database", "deployment"];

const MAX_SUGGESTIONS: usize = 3;
const SIMILARITY_RATIO: f64 = 0.7;
const MAX_LENGTH_DIFFERENCE: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AllowEntry {
    pub name: String,
    pub category: String,
}

/// Approved package names and their declared categories.
///
/// Iteration order is the document's key order as deserialised (keys are
/// sorted by `serde_json`), so suggestions are deterministic.
#[derive(Clone, Debug, Default)]
pub struct AllowList {
    entries: Vec<AllowEntry>,
    index: HashMap<String, usize>,
    categories: Vec<String>,
}

impl AllowList {
    /// Build from `(name, category)` pairs, keeping the first category seen
    /// for duplicate names.
    pub fn from_entries<I, N, C>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        let mut list = Self::default();
        for (name, category) in entries {
            list.push(name.into(), category.into());
        }
        list
    }

    pub fn from_json_str(contents: &str) -> std::result::Result<Self, serde_json::Error> {
        let document: Value = serde_json::from_str(contents)?;
        Ok(Self::from_document(&document))
    }

    /// Load and flatten the allow-list document at `path`.
    ///
    /// # Errors
    ///
    /// Missing or malformed documents are fatal for the allow-list check.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        if !fs.exists(path) {
            return Err(ComplianceError::allow_list("file not found", path));
        }
        let contents = fs.read_to_string(path)?;
        let list = Self::from_json_str(&contents)
            .map_err(|e| ComplianceError::allow_list(format!("invalid JSON: {e}"), path))?;
        tracing::debug!(
            path = %path.display(),
            approved = list.len(),
            "Loaded allow-list"
        );
        Ok(list)
    }

    fn from_document(document: &Value) -> Self {
        let mut list = Self::default();
        let Value::Object(top) = document else {
            return list;
        };

        for (category, value) in top {
            list.categories.push(category.clone());
            match value {
                Value::Array(names) => list.push_names(names, category),
                Value::Object(groups) => {
                    for (group, members) in groups {
                        let label = format!("{category}/{group}");
                        match members {
                            Value::Object(named) => {
                                for name in named.keys() {
                                    list.push(name.clone(), label.clone());
                                }
                            }
                            Value::Array(names) => list.push_names(names, &label),
                            _ => list.push(group.clone(), category.clone()),
                        }
                    }
                }
                _ => {}
            }
        }
        list
    }

    fn push_names(&mut self, names: &[Value], category: &str) {
        for name in names.iter().filter_map(Value::as_str) {
            self.push(name.to_string(), category.to_string());
        }
    }

    fn push(&mut self, name: String, category: String) {
        if self.index.contains_key(&name) {
            return;
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(AllowEntry { name, category });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn category_of(&self, name: &str) -> Option<&str> {
        self.index
            .get(name)
            .map(|&i| self.entries[i].category.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn entries(&self) -> &[AllowEntry] {
        &self.entries
    }

    /// Top-level categories declared by the document.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decides authorization for declared names within one ecosystem.
#[derive(Debug, Clone, Copy)]
pub struct AllowListMatcher<'a> {
    allow_list: &'a AllowList,
    ecosystem: Ecosystem,
}

impl<'a> AllowListMatcher<'a> {
    pub fn new(allow_list: &'a AllowList, ecosystem: Ecosystem) -> Self {
        Self {
            allow_list,
            ecosystem,
        }
    }

    /// Approved iff allow-listed or a builtin of the matcher's ecosystem.
    pub fn is_approved(&self, name: &str) -> bool {
        self.allow_list.contains(name) || self.ecosystem.is_builtin(name)
    }

    pub fn suggest(&self, name: &str) -> Vec<String> {
        suggest(name, self.allow_list.names())
    }
}

/// Up to three approved names that look like `name`, in candidate order.
pub fn suggest<'c>(name: &str, candidates: impl IntoIterator<Item = &'c str>) -> Vec<String> {
    if name.is_empty() {
        return Vec::new();
    }
    let needle = name.to_lowercase();

    candidates
        .into_iter()
        .filter(|candidate| {
            let lowered = candidate.to_lowercase();
            lowered.contains(&needle) || needle.contains(&lowered) || similar_names(name, candidate)
        })
        .take(MAX_SUGGESTIONS)
        .map(str::to_string)
        .collect()
}

/// Similar lengths and at least 70% position-aligned matching characters,
/// measured against the shorter name.
pub fn similar_names(left: &str, right: &str) -> bool {
    let left: Vec<char> = left.to_lowercase().chars().collect();
    let right: Vec<char> = right.to_lowercase().chars().collect();

    if left.len().abs_diff(right.len()) > MAX_LENGTH_DIFFERENCE {
        return false;
    }

    let shorter = left.len().min(right.len());
    let matching = left.iter().zip(&right).filter(|(a, b)| a == b).count();
    matching as f64 >= shorter as f64 * SIMILARITY_RATIO
}

/// Presence and well-formedness check for the allow-list document.
///
/// Missing → critical; unparseable → high; parseable but lacking one of
/// [`EXPECTED_CATEGORIES`] → medium, non-blocking.
pub fn check_allow_list_document(fs: &dyn FileSystem, path: &Path, owner: &str) -> Vec<Violation> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if !fs.exists(path) {
        return vec![Violation::new(
            owner,
            ViolationKind::MissingAllowList,
            Severity::Critical,
            format!("{file_name} file not found"),
        )
        .with_remediation(format!("{owner} must create {file_name}"))];
    }

    let document = fs
        .read_to_string(path)
        .ok()
        .and_then(|contents| serde_json::from_str::<Value>(&contents).ok());

    match document {
        Some(document @ Value::Object(_)) => {
            let declared = AllowList::from_document(&document);
            EXPECTED_CATEGORIES
                .iter()
                .filter(|category| !declared.categories().iter().any(|c| c == **category))
                .map(|category| {
                    Violation::new(
                        owner,
                        ViolationKind::IncompleteAllowList,
                        Severity::Medium,
                        format!("Missing '{category}' specification in {file_name}"),
                    )
                    .non_blocking()
                })
                .collect()
        }
        _ => vec![Violation::new(
            owner,
            ViolationKind::InvalidAllowList,
            Severity::High,
            format!("{file_name} is not a valid JSON object"),
        )
        .with_remediation(format!("Fix the syntax of {file_name}"))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryFileSystem;
    use pretty_assertions::assert_eq;

    fn sample() -> AllowList {
        AllowList::from_json_str(
            r#"{
                "frontend": { "framework": { "react": "18.x", "react-dom": "18.x" }, "state": ["redux"] },
                "backend": ["fastapi", "pydantic"],
                "database": { "engine": { "postgresql": {} } },
                "deployment": { "platform": "fly.io" }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_flattens_all_leaf_names() {
        let list = sample();
        for name in ["react", "react-dom", "redux", "fastapi", "pydantic", "postgresql", "platform"] {
            assert!(list.contains(name), "{name} missing");
        }
        assert_eq!(list.category_of("redux"), Some("frontend/state"));
        assert_eq!(list.category_of("fastapi"), Some("backend"));
        assert_eq!(list.categories().len(), 4);
    }

    #[test]
    fn test_builtins_are_approved() {
        let list = sample();
        let python = AllowListMatcher::new(&list, Ecosystem::Python);
        assert!(python.is_approved("os"));
        assert!(python.is_approved("fastapi"));
        assert!(!python.is_approved("flask"));

        let node = AllowListMatcher::new(&list, Ecosystem::Node);
        assert!(node.is_approved("path"));
        assert!(!node.is_approved("os.path"));
    }

    #[test]
    fn test_substring_suggestion() {
        let list = AllowList::from_entries([("react-dom", "frontend"), ("redux", "frontend")]);
        let matcher = AllowListMatcher::new(&list, Ecosystem::Node);
        assert!(!matcher.is_approved("react"));
        assert_eq!(matcher.suggest("react"), vec!["react-dom".to_string()]);
    }

    #[test]
    fn test_no_suggestion_for_unrelated_name() {
        let list = AllowList::from_entries([("react-dom", "frontend"), ("redux", "frontend")]);
        let matcher = AllowListMatcher::new(&list, Ecosystem::Node);
        assert!(!matcher.is_approved("lodash"));
        assert!(matcher.suggest("lodash").is_empty());
    }

    #[test]
    fn test_similar_names() {
        assert!(similar_names("requets", "requests"));
        assert!(similar_names("Flask", "flasq"));
        assert!(!similar_names("redux", "react"));
        assert!(!similar_names("a", "abcd"));
    }

    #[test]
    fn test_suggestions_capped_at_three_in_candidate_order() {
        let candidates = ["pkg-a", "pkg-b", "pkg-c", "pkg-d"];
        assert_eq!(suggest("pkg", candidates), vec!["pkg-a", "pkg-b", "pkg-c"]);
    }

    #[test]
    fn test_empty_name_has_no_suggestions() {
        assert!(suggest("", ["anything"]).is_empty());
    }

    #[test]
    fn test_load_missing_document_is_error() {
        let fs = MemoryFileSystem::new();
        let err = AllowList::load(&fs, Path::new("design/technology-lock.json")).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_load_malformed_document_is_error() {
        let fs = MemoryFileSystem::new().with_file("lock.json", "{ not json");
        assert!(AllowList::load(&fs, Path::new("lock.json")).is_err());
    }

    #[test]
    fn test_document_check_missing() {
        let fs = MemoryFileSystem::new();
        let violations =
            check_allow_list_document(&fs, Path::new("d/technology-lock.json"), "solution-architect");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::MissingAllowList);
        assert_eq!(violations[0].severity, Severity::Critical);
    }

    #[test]
    fn test_document_check_invalid() {
        let fs = MemoryFileSystem::new().with_file("lock.json", "[1, 2");
        let violations = check_allow_list_document(&fs, Path::new("lock.json"), "owner");
        assert_eq!(violations[0].kind, ViolationKind::InvalidAllowList);
        assert!(violations[0].blocks_readiness());
    }

    #[test]
    fn test_document_check_incomplete_is_non_blocking() {
        let fs = MemoryFileSystem::new().with_file("lock.json", r#"{"frontend": [], "backend": []}"#);
        let violations = check_allow_list_document(&fs, Path::new("lock.json"), "owner");
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| !v.blocks_readiness()));
        assert!(violations.iter().all(|v| v.severity == Severity::Medium));
    }
}
