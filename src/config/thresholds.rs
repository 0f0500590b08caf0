use crate::complexity::ComplexityThresholds;
use serde::{Deserialize, Serialize};

/// Numeric gates applied by the compliance checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    /// Score at or above which a phase artifact counts as complete.
    #[serde(default = "default_completion_threshold")]
    pub completion_threshold: f64,

    #[serde(default = "default_max_function_lines")]
    pub max_function_lines: usize,

    #[serde(default = "default_max_cyclomatic")]
    pub max_cyclomatic: u32,

    /// Minimum total coverage percentage for a commit.
    #[serde(default = "default_min_coverage")]
    pub min_coverage: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            completion_threshold: default_completion_threshold(),
            max_function_lines: default_max_function_lines(),
            max_cyclomatic: default_max_cyclomatic(),
            min_coverage: default_min_coverage(),
        }
    }
}

impl ThresholdsConfig {
    pub fn complexity(&self) -> ComplexityThresholds {
        ComplexityThresholds {
            max_function_lines: self.max_function_lines,
            max_cyclomatic: self.max_cyclomatic,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.completion_threshold > 0.0 && self.completion_threshold <= 1.0) {
            return Err(format!(
                "completion_threshold must be in (0, 1], got {}",
                self.completion_threshold
            ));
        }
        if !(0.0..=100.0).contains(&self.min_coverage) {
            return Err(format!(
                "min_coverage must be in [0, 100], got {}",
                self.min_coverage
            ));
        }
        if self.max_function_lines == 0 {
            return Err("max_function_lines must be greater than 0".to_string());
        }
        if self.max_cyclomatic == 0 {
            return Err("max_cyclomatic must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn default_completion_threshold() -> f64 {
    0.8
}
fn default_max_function_lines() -> usize {
    20
}
fn default_max_cyclomatic() -> u32 {
    5
}
fn default_min_coverage() -> f64 {
    90.0
}
