//! Parse-tree block extraction for Python.
//!
//! Every `function_definition` (methods and nested functions included) is a
//! block. Its branch points are counted over the whole subtree, so a nested
//! function's branches also count toward its enclosing function.

use super::{BlockStrategy, ComplexityMetric, Extraction};
use crate::errors::Result;
use crate::parsing::{first_error_line, node_line, node_text, parse_python, walk_descendants};
use tree_sitter::Node;

const BRANCH_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "for_statement",
    "while_statement",
    "except_clause",
    "except_group_clause",
];

pub struct PythonTreeStrategy;

impl BlockStrategy for PythonTreeStrategy {
    fn extract(&self, source: &str) -> Result<Extraction> {
        let tree = parse_python(source)?;
        let root = tree.root_node();

        if root.has_error() {
            return Ok(Extraction::SyntaxError {
                line: first_error_line(root),
            });
        }

        let mut blocks = Vec::new();
        walk_descendants(root, &mut |node| {
            if node.kind() == "function_definition" {
                blocks.push(function_metric(node, source));
            }
        });
        Ok(Extraction::Blocks(blocks))
    }
}

fn function_metric(function: Node, source: &str) -> ComplexityMetric {
    let name = function
        .child_by_field_name("name")
        .map(|n| node_text(&n, source).to_string())
        .unwrap_or_else(|| "<anonymous>".to_string());

    let start_line = node_line(&function);
    let end_line = function.end_position().row + 1;

    ComplexityMetric::new(name, start_line, end_line, branch_points(function, source))
}

fn branch_points(function: Node, source: &str) -> u32 {
    let mut count = 0;
    let mut cursor = function.walk();
    for child in function.children(&mut cursor) {
        walk_descendants(child, &mut |node| {
            count += node_branch_weight(node, source);
        });
    }
    count
}

fn node_branch_weight(node: Node, source: &str) -> u32 {
    if BRANCH_KINDS.contains(&node.kind()) {
        return 1;
    }
    if node.kind() == "boolean_operator" && is_chain_head(node, source) {
        return chain_operands(node, source).saturating_sub(1);
    }
    0
}

fn boolean_operator_of<'a>(node: Node, source: &'a str) -> Option<&'a str> {
    if node.kind() != "boolean_operator" {
        return None;
    }
    node.child_by_field_name("operator")
        .map(|op| node_text(&op, source))
}

/// A chain is counted once, at its outermost same-operator node.
fn is_chain_head(node: Node, source: &str) -> bool {
    let op = boolean_operator_of(node, source);
    match node.parent() {
        Some(parent) => boolean_operator_of(parent, source) != op,
        None => true,
    }
}

/// Operands of a flattened `a and b and c` chain. Parenthesised or
/// mixed-operator sub-expressions count as one operand here and are
/// counted as chains of their own when the walk reaches them.
fn chain_operands(node: Node, source: &str) -> u32 {
    let op = boolean_operator_of(node, source);
    ["left", "right"]
        .iter()
        .filter_map(|field| node.child_by_field_name(field))
        .map(|operand| {
            if boolean_operator_of(operand, source) == op {
                chain_operands(operand, source)
            } else {
                1
            }
        })
        .sum()
}

/// Public function names and their lines, for the untested-function check.
pub fn public_functions(blocks: &[ComplexityMetric]) -> Vec<(&str, usize)> {
    blocks
        .iter()
        .filter(|block| !block.name.starts_with('_'))
        .map(|block| (block.name.as_str(), block.start_line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn blocks(src: &str) -> Vec<ComplexityMetric> {
        match PythonTreeStrategy.extract(src).unwrap() {
            Extraction::Blocks(blocks) => blocks,
            other => panic!("expected blocks, got {other:?}"),
        }
    }

    #[test]
    fn test_single_branch_function() {
        let src = indoc! {"
            def sign(x):
                if x > 0:
                    return 1
                return 0
        "};
        let found = blocks(src);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "sign");
        assert_eq!(found[0].line_span(), 3);
        assert_eq!(found[0].cyclomatic(), 2);
    }

    #[test]
    fn test_all_branch_kinds_counted() {
        let src = indoc! {"
            def busy(items):
                for item in items:
                    while item:
                        item -= 1
                if items:
                    pass
                elif not items:
                    pass
                try:
                    pass
                except ValueError:
                    pass
                return [i for i in items if i]
        "};
        // for, while, if, elif, except; comprehension filters are not counted
        assert_eq!(blocks(src)[0].cyclomatic(), 6);
    }

    #[test]
    fn test_boolean_chain_adds_operands_minus_one() {
        let src = indoc! {"
            def check(a, b, c, d):
                return a and b and c or d
        "};
        // `a and b and c` adds 2, the outer `... or d` adds 1
        assert_eq!(blocks(src)[0].cyclomatic(), 4);
    }

    #[test]
    fn test_nested_function_branches_count_toward_outer() {
        let src = indoc! {"
            class Service:
                def handle(self, x):
                    def inner(y):
                        if y:
                            return 1
                    return inner(x)
        "};
        let found = blocks(src);
        let names: Vec<_> = found.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["handle", "inner"]);
        assert_eq!(found[0].cyclomatic(), 2);
        assert_eq!(found[1].cyclomatic(), 2);
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let result = PythonTreeStrategy.extract("def broken(:\n    pass\n").unwrap();
        assert!(matches!(result, Extraction::SyntaxError { .. }));
    }

    #[test]
    fn test_public_functions_skip_private() {
        let src = indoc! {"
            def visible():
                pass

            def _hidden():
                pass
        "};
        let found = blocks(src);
        assert_eq!(public_functions(&found), vec![("visible", 1)]);
    }
}
