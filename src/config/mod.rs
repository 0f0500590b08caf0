//! Configuration for the compliance checks.
//!
//! Read from `.phasegate.toml`, found by searching the working directory and
//! its ancestors. The configuration is a plain value handed to the
//! orchestrator; nothing here is global.

mod core;
mod loader;
mod thresholds;

pub use self::core::{ComplianceConfig, HooksConfig, IssuesConfig, TestRunnerConfig};
pub use self::loader::{
    directory_ancestors, discover_config, load_config_from_path, parse_and_validate_config,
    LoadedConfig, CONFIG_FILE_NAME,
};
pub use self::thresholds::ThresholdsConfig;
