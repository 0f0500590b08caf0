//! Brace-depth block extraction for JavaScript and TypeScript.
//!
//! A function-like block starts at a line that looks like a function
//! declaration, a function-valued binding, or a method, and ends where brace
//! depth returns to zero. String literals, template literals and comments
//! are blanked out before braces and branch keywords are counted, so
//! `"{"` or `// if` do not skew the result.
//!
//! Known limits: regex literals containing braces or quotes and multi-line
//! method signatures are not understood. A block that never closes is
//! dropped.

use super::{BlockStrategy, ComplexityMetric, Extraction};
use crate::errors::Result;
use once_cell::sync::Lazy;
use regex::Regex;

static FUNCTION_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)?\s*\(")
        .expect("valid regex")
});

static FUNCTION_BINDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*(?::\s*[^=]+)?=>|[A-Za-z_$][\w$]*\s*=>)",
    )
    .expect("valid regex")
});

static METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?:public|private|protected|static|async|readonly|override|get|set)\s+)*\*?([A-Za-z_$][\w$]*)\s*\([^)]*\)\s*(?::\s*[^{]+)?\{",
    )
    .expect("valid regex")
});

static BRANCH_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:if|for|while|catch)\b").expect("valid regex"));

const NON_METHOD_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "with", "function", "return", "else", "do",
];

pub struct BraceDepthStrategy;

impl BlockStrategy for BraceDepthStrategy {
    fn extract(&self, source: &str) -> Result<Extraction> {
        Ok(Extraction::Blocks(scan_blocks(source)))
    }
}

/// Lexical state that survives a line break.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Carry {
    #[default]
    Code,
    BlockComment,
    Template,
}

/// Blanks string contents and comments out of source lines, one line at a
/// time, carrying block comments and template literals across lines.
#[derive(Debug, Default)]
struct Sanitizer {
    carry: Carry,
}

impl Sanitizer {
    fn clean(&mut self, line: &str) -> String {
        let mut out = String::with_capacity(line.len());
        let mut chars = line.chars().peekable();
        let mut quote: Option<char> = None;

        while let Some(c) = chars.next() {
            match self.carry {
                Carry::BlockComment => {
                    if c == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        self.carry = Carry::Code;
                    }
                    continue;
                }
                Carry::Template => {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        '`' => {
                            self.carry = Carry::Code;
                            out.push('`');
                        }
                        _ => {}
                    }
                    continue;
                }
                Carry::Code => {}
            }

            if let Some(q) = quote {
                match c {
                    '\\' => {
                        chars.next();
                    }
                    _ if c == q => {
                        quote = None;
                        out.push(q);
                    }
                    _ => {}
                }
                continue;
            }

            match c {
                '/' if chars.peek() == Some(&'/') => break,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    self.carry = Carry::BlockComment;
                }
                '\'' | '"' => {
                    quote = Some(c);
                    out.push(c);
                }
                '`' => {
                    self.carry = Carry::Template;
                    out.push(c);
                }
                _ => out.push(c),
            }
        }

        out
    }
}

fn signature_name(line: &str) -> Option<String> {
    if let Some(caps) = FUNCTION_DECLARATION.captures(line) {
        return Some(
            caps.get(1)
                .map_or_else(|| "<anonymous>".to_string(), |m| m.as_str().to_string()),
        );
    }
    if let Some(caps) = FUNCTION_BINDING.captures(line) {
        return Some(caps[1].to_string());
    }
    METHOD
        .captures(line)
        .map(|caps| caps[1].to_string())
        .filter(|name| !NON_METHOD_KEYWORDS.contains(&name.as_str()))
}

fn branch_points(line: &str) -> u32 {
    let keywords = BRANCH_KEYWORD.find_iter(line).count();
    let short_circuits = line.matches("&&").count() + line.matches("||").count();
    (keywords + short_circuits) as u32
}

fn brace_delta(line: &str) -> i64 {
    line.chars().fold(0, |depth, c| match c {
        '{' => depth + 1,
        '}' => depth - 1,
        _ => depth,
    })
}

#[derive(Debug)]
struct OpenBlock {
    name: String,
    start_line: usize,
    depth: i64,
    seen_open: bool,
    branches: u32,
}

fn scan_blocks(source: &str) -> Vec<ComplexityMetric> {
    let mut sanitizer = Sanitizer::default();
    let mut blocks = Vec::new();
    let mut current: Option<OpenBlock> = None;

    for (index, raw) in source.lines().enumerate() {
        let line_no = index + 1;
        let cleaned = sanitizer.clean(raw);
        let line = cleaned.trim();

        if current.is_none() {
            let Some(name) = signature_name(line) else {
                continue;
            };
            // Expression-bodied arrow on one line: nothing to track
            if !line.contains('{') && line.ends_with(';') {
                blocks.push(ComplexityMetric::new(name, line_no, line_no, branch_points(line)));
                continue;
            }
            current = Some(OpenBlock {
                name,
                start_line: line_no,
                depth: 0,
                seen_open: false,
                branches: 0,
            });
        }

        let Some(block) = current.as_mut() else {
            continue;
        };
        block.depth += brace_delta(line);
        block.seen_open |= line.contains('{');
        block.branches += branch_points(line);

        if block.seen_open && block.depth <= 0 {
            blocks.push(ComplexityMetric::new(
                block.name.clone(),
                block.start_line,
                line_no,
                block.branches,
            ));
            current = None;
        } else if !block.seen_open && block.depth < 0 {
            tracing::debug!(name = %block.name, line = line_no, "Abandoning block closed before it opened");
            current = None;
        }
    }

    if let Some(block) = current {
        tracing::debug!(
            name = %block.name,
            start_line = block.start_line,
            "Dropping unterminated block"
        );
    }

    blocks
}
