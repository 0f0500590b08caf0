use crate::config::CONFIG_FILE_NAME;
use anyhow::{Context, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# phasegate configuration

project_name = ""
design_docs_root = "docs/design"
# allow_list_file = "technology-lock.json"
# phases_file = "phases.toml"

[hooks]
tdd_guard_enabled = true
workflow_enforcement = true
auto_issue_creation = true
quality_gates = true
technology_lock_enforcement = true
strict_mode = true

[thresholds]
completion_threshold = 0.8
max_function_lines = 20
max_cyclomatic = 5
min_coverage = 90.0

[test_runner]
# command = ["pytest", "--cov", "--cov-report=json"]
# coverage_report = "coverage.json"

[issues]
enabled = true
labels = ["compliance", "blocking"]
"#;

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created {} configuration file", config_path.display());

    Ok(())
}
