use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::core::ComplianceConfig;
use crate::errors::{ComplianceError, Result};

pub const CONFIG_FILE_NAME: &str = ".phasegate.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// A configuration together with the file it came from, if any.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ComplianceConfig,
    pub source: Option<PathBuf>,
}

pub(crate) fn read_config_file(path: &Path) -> std::result::Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Parse and validate config from a TOML string
pub fn parse_and_validate_config(contents: &str) -> std::result::Result<ComplianceConfig, String> {
    let config = toml::from_str::<ComplianceConfig>(contents)
        .map_err(|e| format!("Failed to parse {CONFIG_FILE_NAME}: {e}"))?;
    config.validate()?;
    Ok(config)
}

/// Load an explicitly named config file. Missing or invalid files are errors.
pub fn load_config_from_path(path: &Path) -> Result<LoadedConfig> {
    let contents = read_config_file(path).map_err(|e| ComplianceError::io(path, e))?;
    let config = parse_and_validate_config(&contents)
        .map_err(|message| ComplianceError::config_with_path(message, path))?;

    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    tracing::debug!(path = %path.display(), "Loaded config");
    Ok(LoadedConfig {
        config: config.anchored_at(&base),
        source: Some(path.to_path_buf()),
    })
}

/// Generate directory ancestors up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Search `start` and its ancestors for `.phasegate.toml`.
///
/// No file found means defaults anchored at `start`. A file that exists but
/// fails to parse or validate is an error rather than a silent fallback.
pub fn discover_config(start: &Path) -> Result<LoadedConfig> {
    let found = directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file());

    match found {
        Some(path) => load_config_from_path(&path),
        None => {
            tracing::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            Ok(LoadedConfig {
                config: ComplianceConfig::default().anchored_at(start),
                source: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let config = parse_and_validate_config(indoc! {r#"
            project_name = "shop"
            design_docs_root = "design"
            allow_list_file = "stack.json"

            [hooks]
            strict_mode = false
            auto_issue_creation = false

            [thresholds]
            min_coverage = 75.0
            max_cyclomatic = 8

            [test_runner]
            command = ["pytest", "--cov"]
            coverage_report = "coverage.json"

            [issues]
            labels = ["process"]
        "#})
        .unwrap();

        assert_eq!(config.project_name, "shop");
        assert_eq!(config.allow_list_file.as_deref(), Some("stack.json"));
        assert!(!config.hooks.strict_mode);
        assert!(config.hooks.tdd_guard_enabled);
        assert_eq!(config.thresholds.min_coverage, 75.0);
        assert_eq!(config.thresholds.max_function_lines, 20);
        assert_eq!(config.test_runner.command.as_ref().map(Vec::len), Some(2));
        assert_eq!(config.issues.labels, vec!["process"]);
        assert!(config.issues.enabled);
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let err = parse_and_validate_config("[thresholds]\ncompletion_threshold = 1.5\n").unwrap_err();
        assert!(err.contains("completion_threshold"));
    }

    #[test]
    fn test_directory_ancestors_limit() {
        let dirs: Vec<_> = directory_ancestors(PathBuf::from("/a/b/c/d"), 3).collect();
        assert_eq!(
            dirs,
            vec![PathBuf::from("/a/b/c/d"), PathBuf::from("/a/b/c"), PathBuf::from("/a/b")]
        );
    }

    #[test]
    fn test_discover_walks_up_and_anchors_root() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "project_name = \"demo\"\n").unwrap();
        let nested = temp.path().join("src/app");
        std::fs::create_dir_all(&nested).unwrap();

        let loaded = discover_config(&nested).unwrap();
        assert_eq!(loaded.config.project_name, "demo");
        assert_eq!(loaded.source, Some(temp.path().join(CONFIG_FILE_NAME)));
        assert_eq!(loaded.config.project_root, temp.path().join("."));
    }

    #[test]
    fn test_discover_defaults_without_file() {
        let temp = TempDir::new().unwrap();
        let loaded = discover_config(temp.path()).unwrap();
        assert!(loaded.source.is_none());
        assert_eq!(
            loaded.config.design_docs_dir(),
            temp.path().join(".").join("docs/design")
        );
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp = TempDir::new().unwrap();
        let err = load_config_from_path(&temp.path().join("nope.toml")).unwrap_err();
        assert!(err.is_configuration_error() || matches!(err, ComplianceError::Io { .. }));
    }

    #[test]
    fn test_malformed_discovered_file_is_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "project_name = [").unwrap();
        assert!(discover_config(temp.path()).is_err());
    }
}
