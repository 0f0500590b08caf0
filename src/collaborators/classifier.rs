use super::{FileClass, FileClassifier};
use crate::phases::PhaseSchema;
use std::path::{Component, Path};
use std::sync::Arc;

const SOURCE_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "jsx", "tsx", "mjs", "java", "cpp", "c", "go", "rs",
];

const TEST_DIRECTORIES: &[&str] = &["tests", "test", "__tests__", "spec"];

/// Test files are recognised by name (`test_x`, `x_test`, `x.test`,
/// `x.spec`) or by living under a test directory.
pub fn is_test_file(path: &Path) -> bool {
    let in_test_dir = path.parent().is_some_and(|parent| {
        parent.components().any(|c| match c {
            Component::Normal(name) => name
                .to_str()
                .is_some_and(|name| TEST_DIRECTORIES.contains(&name)),
            _ => false,
        })
    });
    if in_test_dir {
        return true;
    }

    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    stem.starts_with("test")
        || stem.ends_with("_test")
        || stem.ends_with(".test")
        || stem.ends_with(".spec")
}

/// Classifies by file name against the phase schema, then by extension.
pub struct DefaultFileClassifier {
    schema: Arc<PhaseSchema>,
    allow_list_file: String,
}

impl DefaultFileClassifier {
    pub fn new(schema: Arc<PhaseSchema>, allow_list_file: impl Into<String>) -> Self {
        Self {
            schema,
            allow_list_file: allow_list_file.into(),
        }
    }
}

impl FileClassifier for DefaultFileClassifier {
    fn classify(&self, path: &Path) -> FileClass {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        if file_name == self.allow_list_file || is_test_file(path) {
            return FileClass::Neither;
        }
        if let Some(phase) = self.schema.owner_of_artifact(file_name) {
            return FileClass::PhaseArtifact {
                phase: phase.id.clone(),
            };
        }

        let is_source = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext));
        if is_source {
            FileClass::SourceUnit
        } else {
            FileClass::Neither
        }
    }
}
