//! Detection of syntax newer than ES5

use super::js::{position, visit};
use super::{Diagnostic, DiagnosticKind};
use tree_sitter::Node;

pub(super) fn collect_unsupported(root: Node<'_>, diagnostics: &mut Vec<Diagnostic>) {
    visit(root, &mut |node| {
        if let Some(feature) = unsupported_feature(node) {
            let (line, column) = position(node);
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::UnsupportedFeature,
                format!(
                    "Transforming {} to the configured target environment (\"es5\") is not supported yet",
                    feature
                ),
                line,
                column,
            ));
        }
        true
    });
}

fn unsupported_feature(node: Node<'_>) -> Option<&'static str> {
    // Keyword tokens share kind names with the constructs they start
    if !node.is_named() {
        return None;
    }

    match node.kind() {
        "lexical_declaration" => match node.child(0).map(|keyword| keyword.kind()) {
            Some("const") => Some("const"),
            _ => Some("let"),
        },
        "arrow_function" => Some("arrow functions"),
        "class_declaration" | "class" => Some("class syntax"),
        "template_string" => Some("template literals"),
        "generator_function" | "generator_function_declaration" => Some("generator functions"),
        "object_pattern" | "array_pattern" => Some("destructuring"),
        "spread_element" => Some("spread syntax"),
        "rest_pattern" => Some("rest parameters"),
        "assignment_pattern" => Some("default values"),
        "await_expression" => Some("await"),
        "import_statement" | "export_statement" => Some("module syntax"),
        "for_in_statement" => node
            .child_by_field_name("operator")
            .filter(|op| op.kind() == "of")
            .map(|_| "for-of loops"),
        "function_declaration" | "function_expression" | "function" if has_child(node, "async") => {
            Some("async functions")
        }
        _ => None,
    }
}

fn has_child(node: Node<'_>, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| child.kind() == kind);
    found
}
