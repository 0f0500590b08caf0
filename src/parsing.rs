//! Tree-sitter plumbing shared by the complexity analyzer and the
//! dependency validator.

use crate::errors::{ComplianceError, Result};
use tree_sitter::{Node, Parser, Tree};

/// Parse Python source into a tree-sitter tree.
///
/// Tree-sitter always produces a tree; callers check `root_node().has_error()`
/// to decide whether the unit parsed cleanly.
pub fn parse_python(source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| ComplianceError::Parser(format!("Failed to set Python language: {e}")))?;
    parser
        .parse(source, None)
        .ok_or_else(|| ComplianceError::Parser("Python parser returned no tree".to_string()))
}

pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// 1-based line of the node's first character.
pub fn node_line(node: &Node) -> usize {
    node.start_position().row + 1
}

/// Pre-order walk over `node` and all its descendants.
pub fn walk_descendants<'t>(node: Node<'t>, visit: &mut impl FnMut(Node<'t>)) {
    visit(node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_descendants(child, visit);
    }
}

/// Location of the first syntax error in the tree, if any.
pub fn first_error_line(node: Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node_line(&node));
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error_line)
}
