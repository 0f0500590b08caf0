//! Test-first checks for individual source units.
//!
//! A unit passes when it has a test file under one of the accepted naming
//! conventions, its functions stay within the size and branching limits, and
//! each public Python function name shows up somewhere in its test files.

use crate::complexity::{python::public_functions, ComplexityAnalyzer, Extraction};
use crate::core::{has_critical, Language, Severity, Violation, ViolationKind};
use crate::io::FileSystem;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Extensions a test file may carry, whatever the unit's own extension. The
/// unit's own extension is always accepted as well.
const TEST_EXTENSIONS: &[&str] = &["py", "js", "ts", "jsx", "tsx"];

/// Extensions that mark a file as a unit needing tests.
const SOURCE_UNIT_EXTENSIONS: &[&str] = &["py", "js", "ts", "jsx", "tsx", "mjs"];

const NON_UNIT_MARKERS: &[&str] = &["test", "spec", "__pycache__"];

/// Outcome of validating one unit.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct UnitVerdict {
    pub compliant: bool,
    pub violations: Vec<Violation>,
}

/// Whether `path` is a source unit that should have tests.
pub fn is_source_unit(path: &Path) -> bool {
    let text = path.to_string_lossy();
    if NON_UNIT_MARKERS.iter().any(|marker| text.contains(marker)) {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_UNIT_EXTENSIONS.contains(&ext))
}

/// Relative test-file names accepted for a unit with base name `stem` and
/// extension `unit_ext`.
fn test_file_names(stem: &str, unit_ext: Option<&str>) -> Vec<String> {
    let own = unit_ext.filter(|ext| !TEST_EXTENSIONS.contains(ext));
    TEST_EXTENSIONS
        .iter()
        .copied()
        .chain(own)
        .flat_map(|ext| {
            [
                format!("test_{stem}.{ext}"),
                format!("{stem}_test.{ext}"),
                format!("{stem}.test.{ext}"),
                format!("test{stem}.{ext}"),
                format!("tests/{stem}.{ext}"),
            ]
        })
        .collect()
}

pub struct TddGuard {
    fs: Arc<dyn FileSystem>,
    project_root: PathBuf,
    analyzer: ComplexityAnalyzer,
}

impl TddGuard {
    pub fn new(fs: Arc<dyn FileSystem>, project_root: impl Into<PathBuf>, analyzer: ComplexityAnalyzer) -> Self {
        Self {
            fs,
            project_root: project_root.into(),
            analyzer,
        }
    }

    pub fn analyzer(&self) -> &ComplexityAnalyzer {
        &self.analyzer
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    fn search_dirs(&self, unit: &Path) -> Vec<PathBuf> {
        let parent = unit.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut dirs = vec![parent.join("tests"), self.project_root.join("tests")];
        dirs.insert(0, parent);
        dirs.dedup();
        dirs
    }

    /// Existing test files for `unit`, in search order.
    pub fn test_files_for(&self, unit: &Path) -> Vec<PathBuf> {
        let unit = self.resolve(unit);
        let Some(stem) = unit.file_stem().and_then(|s| s.to_str()) else {
            return Vec::new();
        };
        let names = test_file_names(stem, unit.extension().and_then(|e| e.to_str()));

        let mut found = Vec::new();
        for dir in self.search_dirs(&unit) {
            if !self.fs.is_dir(&dir) {
                continue;
            }
            for name in &names {
                let candidate = dir.join(name);
                if self.fs.is_file(&candidate) && !found.contains(&candidate) {
                    found.push(candidate);
                }
            }
        }
        found
    }

    pub fn has_corresponding_test(&self, unit: &Path) -> bool {
        !self.test_files_for(unit).is_empty()
    }

    /// Whether the literal `name` occurs in any of the unit's test files.
    pub fn function_appears_tested(&self, name: &str, unit: &Path) -> bool {
        self.test_files_for(unit).iter().any(|test_file| {
            match self.fs.read_to_string(test_file) {
                Ok(text) => text.contains(name),
                Err(e) => {
                    tracing::debug!(path = %test_file.display(), error = %e, "Skipping unreadable test file");
                    false
                }
            }
        })
    }

    pub fn missing_tests_violation(unit: &Path) -> Violation {
        Violation::new(
            unit.display().to_string(),
            ViolationKind::MissingTests,
            Severity::Critical,
            "Implementation file has no corresponding test file",
        )
        .with_remediation(format!("Create test file for {}", unit.display()))
    }

    /// All test-first checks for one unit. Non-units pass untouched.
    pub fn validate_unit(&self, unit: &Path, text: &str) -> UnitVerdict {
        if !is_source_unit(unit) {
            return UnitVerdict {
                compliant: true,
                violations: Vec::new(),
            };
        }

        let mut violations = Vec::new();
        if !self.has_corresponding_test(unit) {
            violations.push(Self::missing_tests_violation(unit));
        }
        violations.extend(self.analyzer.analyze(unit, text));
        violations.extend(self.untested_functions(unit, text));

        tracing::debug!(
            path = %unit.display(),
            violations = violations.len(),
            "Validated source unit"
        );

        UnitVerdict {
            compliant: !has_critical(&violations),
            violations,
        }
    }

    fn untested_functions(&self, unit: &Path, text: &str) -> Vec<Violation> {
        if Language::from_path(unit) != Language::Python {
            return Vec::new();
        }
        // Unparseable units were already reported by the analyzer
        let Ok(Some(Extraction::Blocks(blocks))) = self.analyzer.measure(Language::Python, text) else {
            return Vec::new();
        };

        public_functions(&blocks)
            .into_iter()
            .filter(|(name, _)| !self.function_appears_tested(name, unit))
            .map(|(name, line)| {
                Violation::new(
                    unit.display().to_string(),
                    ViolationKind::UntestedFunction,
                    Severity::High,
                    format!("Function '{name}' appears to have no tests"),
                )
                .at_line(line)
                .with_remediation(format!("Write tests for function '{name}' before implementation"))
            })
            .collect()
    }
}
