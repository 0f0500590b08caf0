//! Document completeness scoring.
//!
//! A lenient textual presence check: a required section counts as present if
//! any of its header spellings occurs anywhere in the document,
//! case-insensitively. A heading with no body still counts.

/// Header spellings that mark `label` as present.
fn candidate_spellings(label: &str) -> [String; 6] {
    [
        format!("# {label}"),
        format!("## {label}"),
        format!("### {label}"),
        format!("**{label}**"),
        format!("{label}:"),
        label.split_whitespace().collect::<String>(),
    ]
}

fn section_present(lowered_content: &str, label: &str) -> bool {
    candidate_spellings(label)
        .iter()
        .filter(|candidate| !candidate.is_empty())
        .any(|candidate| lowered_content.contains(&candidate.to_lowercase()))
}

/// Fraction of `required_sections` present in `content`, in `[0, 1]`.
///
/// Empty content or an empty requirement list scores 0.
pub fn score<S: AsRef<str>>(content: &str, required_sections: &[S]) -> f64 {
    if content.trim().is_empty() || required_sections.is_empty() {
        return 0.0;
    }

    let lowered = content.to_lowercase();
    let present = required_sections
        .iter()
        .filter(|label| section_present(&lowered, label.as_ref()))
        .count();

    present as f64 / required_sections.len() as f64
}

/// Required sections that are not present, in declaration order.
pub fn missing_sections<'a, S: AsRef<str>>(
    content: &str,
    required_sections: &'a [S],
) -> Vec<&'a str> {
    let lowered = content.to_lowercase();
    required_sections
        .iter()
        .map(AsRef::as_ref)
        .filter(|label| !section_present(&lowered, label))
        .collect()
}
