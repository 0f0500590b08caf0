//! Coverage report readers: LCOV tracefiles and coverage.py JSON.

use crate::errors::{ComplianceError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileCoverage {
    pub path: PathBuf,
    pub percent: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CoverageSummary {
    pub total_percent: f64,
    pub files: Vec<FileCoverage>,
}

impl CoverageSummary {
    /// Files whose coverage is strictly below `threshold`.
    pub fn files_below(&self, threshold: f64) -> Vec<FileCoverage> {
        self.files
            .iter()
            .filter(|file| file.percent < threshold)
            .cloned()
            .collect()
    }
}

fn percent(hit: u64, found: u64) -> f64 {
    if found == 0 {
        100.0
    } else {
        hit as f64 / found as f64 * 100.0
    }
}

/// Parse an LCOV tracefile.
///
/// Line totals come from `LF`/`LH` when present, otherwise from the `DA`
/// records of the file.
pub fn parse_lcov(contents: &str) -> Result<CoverageSummary> {
    use lcov::{Reader, Record};

    let mut summary = CoverageSummary::default();
    let mut current_file: Option<PathBuf> = None;
    let (mut lines_found, mut lines_hit) = (None::<u64>, None::<u64>);
    let (mut da_found, mut da_hit) = (0u64, 0u64);
    let (mut total_found, mut total_hit) = (0u64, 0u64);

    for record in Reader::new(contents.as_bytes()) {
        let record = record.map_err(|e| ComplianceError::collaborator("lcov", e.to_string()))?;

        match record {
            Record::SourceFile { path } => {
                current_file = Some(path);
                lines_found = None;
                lines_hit = None;
                da_found = 0;
                da_hit = 0;
            }
            Record::LineData { count, .. } => {
                da_found += 1;
                if count > 0 {
                    da_hit += 1;
                }
            }
            Record::LinesFound { found } => lines_found = Some(u64::from(found)),
            Record::LinesHit { hit } => lines_hit = Some(u64::from(hit)),
            Record::EndOfRecord => {
                let found = lines_found.unwrap_or(da_found);
                let hit = lines_hit.unwrap_or(da_hit);
                total_found += found;
                total_hit += hit;
                if let Some(path) = current_file.take() {
                    summary.files.push(FileCoverage {
                        path,
                        percent: percent(hit, found),
                    });
                }
            }
            _ => {}
        }
    }

    summary.total_percent = percent(total_hit, total_found);
    Ok(summary)
}

#[derive(Debug, Default, Deserialize)]
struct CoverageJson {
    #[serde(default)]
    totals: CoverageTotals,
    #[serde(default)]
    files: BTreeMap<String, CoverageFile>,
}

#[derive(Debug, Default, Deserialize)]
struct CoverageTotals {
    #[serde(default)]
    percent_covered: f64,
}

#[derive(Debug, Default, Deserialize)]
struct CoverageFile {
    #[serde(default)]
    summary: CoverageTotals,
}

/// Parse a coverage.py `coverage.json` report.
pub fn parse_coverage_json(contents: &str) -> Result<CoverageSummary> {
    let report: CoverageJson = serde_json::from_str(contents)?;
    Ok(CoverageSummary {
        total_percent: report.totals.percent_covered,
        files: report
            .files
            .into_iter()
            .map(|(path, file)| FileCoverage {
                path: PathBuf::from(path),
                percent: file.summary.percent_covered,
            })
            .collect(),
    })
}

/// LCOV for `.info`/`.lcov`, coverage.py JSON otherwise.
pub fn is_lcov_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "info" | "lcov"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_parse_lcov_totals_and_files() {
        let lcov = indoc! {"
            SF:src/a.py
            DA:1,1
            DA:2,0
            LF:2
            LH:1
            end_of_record
            SF:src/b.py
            DA:1,3
            DA:2,1
            DA:3,1
            end_of_record
        "};
        let summary = parse_lcov(lcov).unwrap();
        assert_eq!(summary.files.len(), 2);
        assert_eq!(summary.files[0].percent, 50.0);
        assert_eq!(summary.files[1].percent, 100.0);
        assert_eq!(summary.total_percent, 80.0);
        assert_eq!(summary.files_below(90.0).len(), 1);
    }

    #[test]
    fn test_parse_coverage_json() {
        let json = r#"{
            "totals": {"percent_covered": 87.5},
            "files": {
                "app/models.py": {"summary": {"percent_covered": 100.0}},
                "app/views.py": {"summary": {"percent_covered": 62.0}}
            }
        }"#;
        let summary = parse_coverage_json(json).unwrap();
        assert_eq!(summary.total_percent, 87.5);
        let low = summary.files_below(90.0);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].path, PathBuf::from("app/views.py"));
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(parse_coverage_json("{not json").is_err());
    }

    #[test]
    fn test_report_format_by_extension() {
        assert!(is_lcov_path(Path::new("coverage/lcov.info")));
        assert!(is_lcov_path(Path::new("out.lcov")));
        assert!(!is_lcov_path(Path::new("coverage.json")));
    }
}
