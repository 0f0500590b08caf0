//! Extraction of declared third-party dependencies and their validation
//! against the allow-list.
//!
//! Sources understood:
//! - Python modules: `import x.y`, `from x import y` (relative imports skipped)
//! - JS/TS modules: `import … from '…'`, `import '…'`, `require('…')`
//!   (relative and absolute paths skipped)
//! - `package.json` dependency tables
//! - `requirements*.txt`

use super::{AllowList, AllowListMatcher, Ecosystem};
use crate::core::{Language, Severity, Violation, ViolationKind};
use crate::parsing::{node_line, node_text, parse_python, walk_descendants};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

static JS_IMPORT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"import\s+[^;]*?\s+from\s+['"]([^'"]+)['"]"#,
        r#"import\s+['"]([^'"]+)['"]"#,
        r#"require\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static import pattern"))
    .collect()
});

static REQUIREMENT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)").expect("static requirement pattern"));

const PACKAGE_JSON_TABLES: &[&str] = &["dependencies", "devDependencies", "peerDependencies"];

/// One dependency declaration found in a file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeclaredDependency {
    /// Package name checked against the allow-list.
    pub package: String,
    /// The full import path or requirement line it came from.
    pub declared_as: String,
    pub line: Option<usize>,
    pub ecosystem: Ecosystem,
}

impl DeclaredDependency {
    fn new(package: impl Into<String>, declared_as: impl Into<String>, line: Option<usize>, ecosystem: Ecosystem) -> Self {
        Self {
            package: package.into(),
            declared_as: declared_as.into(),
            line,
            ecosystem,
        }
    }
}

/// Kind of file the validator knows how to read declarations from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DeclarationSource {
    Module(Language),
    PackageJson,
    Requirements,
}

fn declaration_source(path: &Path) -> Option<DeclarationSource> {
    let file_name = path.file_name()?.to_str()?;
    if file_name == "package.json" {
        return Some(DeclarationSource::PackageJson);
    }
    if file_name.starts_with("requirements") && file_name.ends_with(".txt") {
        return Some(DeclarationSource::Requirements);
    }
    match Language::from_path(path) {
        Language::Unknown => None,
        language => Some(DeclarationSource::Module(language)),
    }
}

/// Dependencies declared in `text`, which was read from `path`.
pub fn extract_dependencies(path: &Path, text: &str) -> Vec<DeclaredDependency> {
    match declaration_source(path) {
        Some(DeclarationSource::Module(Language::Python)) => python_imports(text),
        Some(DeclarationSource::Module(_)) => javascript_imports(text),
        Some(DeclarationSource::PackageJson) => package_json_dependencies(path, text),
        Some(DeclarationSource::Requirements) => requirements(text),
        None => Vec::new(),
    }
}

fn python_imports(text: &str) -> Vec<DeclaredDependency> {
    let tree = match parse_python(text) {
        Ok(tree) if !tree.root_node().has_error() => tree,
        _ => {
            tracing::debug!("Skipping import extraction for unparseable Python unit");
            return Vec::new();
        }
    };

    let mut found = Vec::new();
    walk_descendants(tree.root_node(), &mut |node| match node.kind() {
        "import_statement" => {
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                let dotted = match name.kind() {
                    "aliased_import" => name.child_by_field_name("name"),
                    _ => Some(name),
                };
                if let Some(dotted) = dotted {
                    push_python_module(&mut found, node_text(&dotted, text), node_line(&node));
                }
            }
        }
        "import_from_statement" => {
            if let Some(module) = node.child_by_field_name("module_name") {
                if module.kind() == "dotted_name" {
                    push_python_module(&mut found, node_text(&module, text), node_line(&node));
                }
            }
        }
        _ => {}
    });
    found
}

fn push_python_module(found: &mut Vec<DeclaredDependency>, module: &str, line: usize) {
    if let Some(package) = module.split('.').next().filter(|p| !p.is_empty()) {
        found.push(DeclaredDependency::new(package, module, Some(line), Ecosystem::Python));
    }
}

fn javascript_imports(text: &str) -> Vec<DeclaredDependency> {
    let mut found: Vec<(usize, DeclaredDependency)> = Vec::new();
    for pattern in JS_IMPORT_PATTERNS.iter() {
        for captures in pattern.captures_iter(text) {
            let Some(specifier) = captures.get(1) else {
                continue;
            };
            let path = specifier.as_str();
            if path.starts_with('.') || path.starts_with('/') {
                continue;
            }
            let line = text[..specifier.start()].matches('\n').count() + 1;
            let package = javascript_package_name(path);
            if found
                .iter()
                .any(|(offset, _)| *offset == specifier.start())
            {
                continue;
            }
            found.push((
                specifier.start(),
                DeclaredDependency::new(package, path, Some(line), Ecosystem::Node),
            ));
        }
    }
    found.sort_by_key(|(offset, _)| *offset);
    found.into_iter().map(|(_, dep)| dep).collect()
}

/// `@scope/name/sub` → `@scope/name`; `name/sub` → `name`.
fn javascript_package_name(specifier: &str) -> String {
    let mut segments = specifier.split('/');
    match (segments.next(), segments.next()) {
        (Some(scope), Some(name)) if scope.starts_with('@') => format!("{scope}/{name}"),
        (Some(name), _) => name.to_string(),
        _ => specifier.to_string(),
    }
}

fn package_json_dependencies(path: &Path, text: &str) -> Vec<DeclaredDependency> {
    let manifest: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not parse package.json");
            return Vec::new();
        }
    };

    PACKAGE_JSON_TABLES
        .iter()
        .filter_map(|table| manifest.get(*table).and_then(Value::as_object))
        .flat_map(|deps| deps.iter())
        .map(|(name, version)| {
            let declared = format!("{name}@{}", version.as_str().unwrap_or("*"));
            DeclaredDependency::new(name.clone(), declared, None, Ecosystem::None)
        })
        .collect()
}

fn requirements(text: &str) -> Vec<DeclaredDependency> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
                return None;
            }
            REQUIREMENT_NAME.captures(line).map(|caps| {
                DeclaredDependency::new(&caps[1], line, Some(idx + 1), Ecosystem::None)
            })
        })
        .collect()
}

/// Flags declared dependencies that are neither allow-listed nor builtin.
#[derive(Debug, Clone)]
pub struct DependencyValidator {
    allow_list: AllowList,
    strict: bool,
}

impl DependencyValidator {
    pub fn new(allow_list: AllowList, strict: bool) -> Self {
        Self { allow_list, strict }
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    pub fn validate_file(&self, path: &Path, text: &str) -> Vec<Violation> {
        extract_dependencies(path, text)
            .into_iter()
            .filter_map(|dependency| self.check(path, &dependency))
            .collect()
    }

    fn check(&self, path: &Path, dependency: &DeclaredDependency) -> Option<Violation> {
        let matcher = AllowListMatcher::new(&self.allow_list, dependency.ecosystem);
        if matcher.is_approved(&dependency.package) {
            return None;
        }

        let severity = if self.strict {
            Severity::Critical
        } else {
            Severity::Medium
        };
        let mut violation = Violation::new(
            path.display().to_string(),
            ViolationKind::UnauthorizedDependency,
            severity,
            format!(
                "Unauthorized dependency '{}' (declared as '{}')",
                dependency.package, dependency.declared_as
            ),
        );
        if !self.strict {
            violation = violation.non_blocking();
        }
        if let Some(line) = dependency.line {
            violation = violation.at_line(line);
        }

        let suggestions = matcher.suggest(&dependency.package);
        violation = if suggestions.is_empty() {
            violation.with_remediation(format!(
                "Remove '{}' or have it added to the allow-list",
                dependency.package
            ))
        } else {
            let described: Vec<String> = suggestions
                .iter()
                .map(|name| match self.allow_list.category_of(name) {
                    Some(category) => format!("{name} ({category})"),
                    None => name.clone(),
                })
                .collect();
            violation.with_remediation(format!(
                "Replace with an approved alternative: {}",
                described.join(", ")
            ))
        };
        Some(violation)
    }
}
