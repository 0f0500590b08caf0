// Shared fixtures for phasegate integration tests
#![allow(dead_code)]

use phasegate::config::{parse_and_validate_config, ComplianceConfig, CONFIG_FILE_NAME};
use phasegate::phases::PhaseSchema;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Config with issue filing off so no test ever shells out to `gh`.
pub const QUIET_CONFIG: &str = r#"
project_name = "shop"
design_docs_root = "docs/design"

[issues]
enabled = false
"#;

pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), QUIET_CONFIG).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> ComplianceConfig {
        parse_and_validate_config(QUIET_CONFIG)
            .unwrap()
            .anchored_at(self.root())
    }

    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn artifact_dir(&self) -> PathBuf {
        self.root().join("docs/design/shop")
    }

    /// Write a fully scored artifact for `phase_id` from the default table.
    pub fn complete_phase(&self, phase_id: &str) {
        let schema = PhaseSchema::embedded().unwrap();
        let phase = schema.get(phase_id).unwrap();
        let body = complete_document(&phase.required_sections);
        self.write(&format!("docs/design/shop/{}", phase.output_file), &body);
    }

    pub fn approve(&self, allow_list_json: &str) {
        self.write("docs/design/shop/technology-lock.json", allow_list_json);
    }
}

pub fn complete_document(sections: &[String]) -> String {
    sections
        .iter()
        .map(|section| format!("## {section}\n\nDetails.\n\n"))
        .collect()
}

pub const APPROVED_STACK: &str = r#"{
    "frontend": ["react"],
    "backend": ["fastapi", "requests"],
    "database": ["postgresql"],
    "deployment": ["docker"]
}"#;
