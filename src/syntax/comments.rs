//! Doc and trailing comment association.
//!
//! tree-sitter keeps comments as `comment` sibling nodes. A doc comment is
//! the run of comments ending on the line directly above a node, with no
//! blank line in between; a trailing comment starts on the line a node ends.

use tree_sitter::Node;

/// Collect the doc comment lines directly preceding `node`.
pub fn doc_comments(node: Node, source: &[u8]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut next_row = node.start_position().row;
    let mut cur = node.prev_named_sibling();

    while let Some(comment) = cur {
        if comment.kind() != "comment" || comment.end_position().row + 1 != next_row {
            break;
        }
        // A comment sharing a line with earlier code trails that code,
        // including tokens such as an opening brace.
        if let Some(prev) = preceding_token(comment) {
            if prev.kind() != "comment" && prev.end_position().row == comment.start_position().row {
                break;
            }
        }
        lines.push(comment_text(node_text(comment, source)));
        next_row = comment.start_position().row;
        cur = comment.prev_named_sibling();
    }

    lines.reverse();
    lines
}

/// The sibling before `node`, anonymous tokens included, skipping newline
/// terminators.
fn preceding_token(node: Node) -> Option<Node> {
    let mut cur = node.prev_sibling();
    while let Some(n) = cur {
        if n.kind() != "\n" {
            return Some(n);
        }
        cur = n.prev_sibling();
    }
    None
}

/// Find the comment that trails `node` on its last line.
///
/// tree-sitter leaves trailing comments outside the node they follow, so
/// ancestors ending on the same line are checked too.
pub fn trailing_comment(node: Node, source: &[u8]) -> Option<String> {
    let row = node.end_position().row;
    let mut cur = Some(node);

    while let Some(n) = cur {
        if let Some(next) = n.next_named_sibling() {
            if next.kind() == "comment" && next.start_position().row == row {
                return Some(comment_text(node_text(next, source)));
            }
            return None;
        }
        cur = n.parent().filter(|p| p.end_position().row == row);
    }

    None
}

/// Strip comment markers: `// x` becomes `x`, `/* x */` becomes `x`.
pub fn comment_text(raw: &str) -> String {
    if let Some(rest) = raw.strip_prefix("//") {
        rest.strip_prefix(' ').unwrap_or(rest).trim_end().to_string()
    } else if let Some(rest) = raw.strip_prefix("/*") {
        rest.strip_suffix("*/").unwrap_or(rest).trim().to_string()
    } else {
        raw.trim().to_string()
    }
}

fn node_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}
