//! Function-level size and branching analysis for one source unit.
//!
//! Two block-extraction strategies sit behind [`BlockStrategy`]:
//!
//! - [`python::PythonTreeStrategy`]: block boundaries and line spans come from
//!   the tree-sitter parse tree; a unit that fails to parse yields a single
//!   critical syntax-error violation.
//! - [`heuristic::BraceDepthStrategy`]: for ecosystems without a parse tree,
//!   a signature scan followed by brace-depth tracking. Lower precision; an
//!   unterminated block is dropped rather than reported.
//!
//! Both report a [`ComplexityMetric`] per block, and [`ComplexityAnalyzer`]
//! turns the metrics into violations with the same thresholds.

pub mod heuristic;
pub mod python;

use crate::core::{Language, Severity, Violation, ViolationKind};
use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metrics for one function-like block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityMetric {
    pub name: String,
    /// 1-based first line of the block.
    pub start_line: usize,
    /// 1-based last line of the block.
    pub end_line: usize,
    /// Branch points found: conditionals, loops, handlers, and the extra
    /// operands of short-circuit boolean chains.
    pub branch_count: u32,
}

impl ComplexityMetric {
    pub fn new(name: impl Into<String>, start_line: usize, end_line: usize, branch_count: u32) -> Self {
        Self {
            name: name.into(),
            start_line,
            end_line,
            branch_count,
        }
    }

    /// End line minus start line.
    pub fn line_span(&self) -> usize {
        self.end_line.saturating_sub(self.start_line)
    }

    /// Base value 1 plus one per branch point.
    pub fn cyclomatic(&self) -> u32 {
        1 + self.branch_count
    }
}

/// Result of running a block strategy over one unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Extraction {
    Blocks(Vec<ComplexityMetric>),
    SyntaxError { line: Option<usize> },
}

/// A way of recovering function-like blocks from source text.
pub trait BlockStrategy {
    fn extract(&self, source: &str) -> Result<Extraction>;
}

pub fn strategy_for(language: Language) -> Option<Box<dyn BlockStrategy>> {
    type StrategyFactory = fn() -> Box<dyn BlockStrategy>;

    static STRATEGY_MAP: &[(Language, StrategyFactory)] = &[
        (Language::Python, || Box::new(python::PythonTreeStrategy)),
        (Language::JavaScript, || Box::new(heuristic::BraceDepthStrategy)),
        (Language::TypeScript, || Box::new(heuristic::BraceDepthStrategy)),
    ];

    STRATEGY_MAP
        .iter()
        .find(|(lang, _)| *lang == language)
        .map(|(_, factory)| factory())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityThresholds {
    pub max_function_lines: usize,
    pub max_cyclomatic: u32,
}

impl Default for ComplexityThresholds {
    fn default() -> Self {
        Self {
            max_function_lines: 20,
            max_cyclomatic: 5,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ComplexityAnalyzer {
    thresholds: ComplexityThresholds,
}

impl ComplexityAnalyzer {
    pub fn new(thresholds: ComplexityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> ComplexityThresholds {
        self.thresholds
    }

    /// Extract blocks from a unit. `None` when the language has no strategy.
    pub fn measure(&self, language: Language, source: &str) -> Result<Option<Extraction>> {
        strategy_for(language)
            .map(|strategy| strategy.extract(source))
            .transpose()
    }

    /// Violations for one source unit.
    pub fn analyze(&self, path: &Path, source: &str) -> Vec<Violation> {
        let subject = path.display().to_string();
        let language = Language::from_path(path);

        match self.measure(language, source) {
            Ok(Some(Extraction::Blocks(blocks))) => blocks
                .iter()
                .flat_map(|block| self.block_violations(&subject, block))
                .collect(),
            Ok(Some(Extraction::SyntaxError { line })) => {
                let mut violation = Violation::new(
                    subject,
                    ViolationKind::SyntaxError,
                    Severity::Critical,
                    "File has syntax errors",
                )
                .with_remediation("Fix syntax errors before proceeding");
                if let Some(line) = line {
                    violation = violation.at_line(line);
                }
                vec![violation]
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Complexity analysis unavailable");
                Vec::new()
            }
        }
    }

    fn block_violations(&self, subject: &str, block: &ComplexityMetric) -> Vec<Violation> {
        let mut violations = Vec::new();

        let span = block.line_span();
        if span > self.thresholds.max_function_lines {
            violations.push(
                Violation::new(
                    subject,
                    ViolationKind::OverImplementation,
                    Severity::Medium,
                    format!("Function '{}' is too long ({} lines)", block.name, span),
                )
                .at_line(block.start_line)
                .with_remediation("Break function into smaller, testable units"),
            );
        }

        let cyclomatic = block.cyclomatic();
        if cyclomatic > self.thresholds.max_cyclomatic {
            violations.push(
                Violation::new(
                    subject,
                    ViolationKind::HighComplexity,
                    Severity::Medium,
                    format!("Function '{}' has high complexity ({})", block.name, cyclomatic),
                )
                .at_line(block.start_line)
                .with_remediation("Simplify function logic and add more unit tests"),
            );
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_derivations() {
        let metric = ComplexityMetric::new("f", 3, 10, 4);
        assert_eq!(metric.line_span(), 7);
        assert_eq!(metric.cyclomatic(), 5);
    }

    #[test]
    fn test_thresholds_are_strict_greater_than() {
        let analyzer = ComplexityAnalyzer::default();
        let at_limit = ComplexityMetric::new("f", 1, 21, 4);
        assert!(analyzer.block_violations("x.py", &at_limit).is_empty());

        let over = ComplexityMetric::new("g", 1, 22, 5);
        let kinds: Vec<_> = analyzer
            .block_violations("x.py", &over)
            .into_iter()
            .map(|v| v.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![ViolationKind::OverImplementation, ViolationKind::HighComplexity]
        );
    }

    /// `def f(x):` with `branches` sequential ifs, padded to `total_lines`.
    fn python_function(total_lines: usize, branches: usize) -> String {
        let mut lines = vec!["def f(x):".to_string()];
        for i in 0..branches {
            lines.push(format!("    if x == {i}:"));
            lines.push("        x += 1".to_string());
        }
        while lines.len() < total_lines {
            lines.push("    x += 1".to_string());
        }
        lines.join("\n") + "\n"
    }

    /// `function f(x) { ... }` with `branches` one-line ifs, `total_lines` long.
    fn javascript_function(total_lines: usize, branches: usize) -> String {
        let mut lines = vec!["function f(x) {".to_string()];
        for i in 0..branches {
            lines.push(format!("  if (x === {i}) {{ x += 1; }}"));
        }
        while lines.len() < total_lines - 1 {
            lines.push("  x += 1;".to_string());
        }
        lines.push("}".to_string());
        lines.join("\n") + "\n"
    }

    fn kinds(violations: &[Violation]) -> Vec<ViolationKind> {
        violations.iter().map(|v| v.kind).collect()
    }

    #[test]
    fn test_python_source_at_default_limits() {
        let analyzer = ComplexityAnalyzer::default();

        // span 20, cyclomatic 5
        let at_limit = python_function(21, 4);
        assert!(analyzer.analyze(Path::new("m.py"), &at_limit).is_empty());

        // span 21, cyclomatic 6
        let over = python_function(22, 5);
        assert_eq!(
            kinds(&analyzer.analyze(Path::new("m.py"), &over)),
            vec![ViolationKind::OverImplementation, ViolationKind::HighComplexity]
        );
    }

    #[test]
    fn test_javascript_source_at_default_limits() {
        let analyzer = ComplexityAnalyzer::default();

        let at_limit = javascript_function(21, 4);
        assert!(analyzer.analyze(Path::new("m.js"), &at_limit).is_empty());

        let long_only = javascript_function(22, 4);
        assert_eq!(
            kinds(&analyzer.analyze(Path::new("m.js"), &long_only)),
            vec![ViolationKind::OverImplementation]
        );

        let branchy_only = javascript_function(10, 5);
        assert_eq!(
            kinds(&analyzer.analyze(Path::new("m.js"), &branchy_only)),
            vec![ViolationKind::HighComplexity]
        );
    }

    #[test]
    fn test_six_nested_conditionals_over_25_lines() {
        let analyzer = ComplexityAnalyzer::default();

        let mut python = vec!["def deep(x):".to_string()];
        for i in 0..6 {
            python.push(format!("{}if x > {i}:", "    ".repeat(i + 1)));
        }
        python.push(format!("{}return x", "    ".repeat(7)));
        while python.len() < 25 {
            python.push("    x += 1".to_string());
        }
        let python = python.join("\n") + "\n";
        let violations = analyzer.analyze(Path::new("deep.py"), &python);
        assert_eq!(
            kinds(&violations),
            vec![ViolationKind::OverImplementation, ViolationKind::HighComplexity]
        );
        assert!(violations[0].description.contains("(24 lines)"));
        assert!(violations[1].description.contains("(7)"));

        let mut js = vec!["function deep(x) {".to_string()];
        for _ in 0..10 {
            js.push("  x += 1;".to_string());
        }
        for i in 0..6 {
            js.push(format!("{}if (x > {i}) {{", "  ".repeat(i + 1)));
        }
        js.push(format!("{}return x;", "  ".repeat(7)));
        for i in (0..6).rev() {
            js.push(format!("{}}}", "  ".repeat(i + 1)));
        }
        js.push("}".to_string());
        assert_eq!(js.len(), 25);
        let violations = analyzer.analyze(Path::new("deep.ts"), &(js.join("\n") + "\n"));
        assert_eq!(
            kinds(&violations),
            vec![ViolationKind::OverImplementation, ViolationKind::HighComplexity]
        );
    }

    #[test]
    fn test_unknown_language_has_no_strategy() {
        assert!(strategy_for(Language::Unknown).is_none());
        assert!(ComplexityAnalyzer::default()
            .analyze(Path::new("main.go"), "func main() {}")
            .is_empty());
    }

    #[test]
    fn test_custom_thresholds() {
        let analyzer = ComplexityAnalyzer::new(ComplexityThresholds {
            max_function_lines: 2,
            max_cyclomatic: 1,
        });
        let src = "def f(x):\n    if x:\n        return 1\n    return 2\n";
        let violations = analyzer.analyze(Path::new("m.py"), src);
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| v.line == Some(1)));
    }
}
