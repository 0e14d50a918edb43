//! tree-sitter backed JavaScript transformer

use super::{es5, minify, Diagnostic, DiagnosticKind, Severity, Target, TransformOptions, TransformOutput, Transformer};
use tree_sitter::{Node, Parser, Tree};

/// Longest source excerpt quoted in a syntax error
const SNIPPET_LEN: usize = 40;

/// Transformer using the tree-sitter JavaScript grammar
#[derive(Debug, Clone, Copy, Default)]
pub struct JsTransformer;

impl JsTransformer {
    pub fn new() -> Self {
        Self
    }

    pub(super) fn parse(&self, source: &str) -> Result<Tree, Diagnostic> {
        // Parser is not Sync; one per call keeps the transformer shareable across workers
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .map_err(|e| {
                Diagnostic::error(
                    DiagnosticKind::Syntax,
                    format!("Failed to load JavaScript grammar: {}", e),
                    1,
                    1,
                )
            })?;

        parser.parse(source, None).ok_or_else(|| {
            Diagnostic::error(DiagnosticKind::Syntax, "Parser produced no syntax tree", 1, 1)
        })
    }
}

impl Transformer for JsTransformer {
    fn transform(&self, source: &str, options: &TransformOptions) -> TransformOutput {
        let tree = match self.parse(source) {
            Ok(tree) => tree,
            Err(diagnostic) => {
                return TransformOutput {
                    code: source.to_string(),
                    diagnostics: vec![diagnostic],
                }
            }
        };

        let root = tree.root_node();
        let mut diagnostics = Vec::new();

        collect_syntax_errors(root, source, &mut diagnostics);
        collect_suspicious_comparisons(root, source, &mut diagnostics);
        if options.target == Target::Es5 {
            es5::collect_unsupported(root, &mut diagnostics);
        }
        diagnostics.sort_by_key(|d| (d.line, d.column));

        let failed = diagnostics.iter().any(|d| d.severity == Severity::Error);
        // Identifier and syntax passes are left to richer engines
        let code = if options.minify_whitespace && !failed {
            minify::minify(root, source, options.keep_legal_comments)
        } else {
            source.to_string()
        };

        TransformOutput { code, diagnostics }
    }
}

/// Depth-first visit; the callback returns false to skip a node's children
pub(super) fn visit<'tree, F>(node: Node<'tree>, f: &mut F)
where
    F: FnMut(Node<'tree>) -> bool,
{
    if !f(node) {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit(child, f);
    }
}

/// 1-based (line, column) of a node's start
pub(super) fn position(node: Node<'_>) -> (usize, usize) {
    let point = node.start_position();
    (point.row + 1, point.column + 1)
}

fn collect_syntax_errors(root: Node<'_>, source: &str, diagnostics: &mut Vec<Diagnostic>) {
    visit(root, &mut |node| {
        let (line, column) = position(node);

        if node.is_error() {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::Syntax,
                format!("Unexpected \"{}\"", snippet(node, source)),
                line,
                column,
            ));
            return false;
        }

        if node.is_missing() {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::Syntax,
                format!("Expected \"{}\"", node.kind()),
                line,
                column,
            ));
            return false;
        }

        node.has_error()
    });
}

fn collect_suspicious_comparisons(root: Node<'_>, source: &str, diagnostics: &mut Vec<Diagnostic>) {
    visit(root, &mut |node| {
        if node.kind() != "binary_expression" {
            return true;
        }

        let Some(operator) = node.child_by_field_name("operator").map(|op| op.kind()) else {
            return true;
        };
        if !matches!(operator, "===" | "!==" | "==" | "!=") {
            return true;
        }

        let operands = [node.child_by_field_name("left"), node.child_by_field_name("right")];
        for operand in operands.into_iter().flatten() {
            let (line, column) = position(operand);

            if is_negative_zero(operand, source) {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::NegativeZeroComparison,
                    format!(
                        "Comparison with -0 using the \"{}\" operator will also match 0",
                        operator
                    ),
                    line,
                    column,
                ));
            } else if is_nan(operand, source) {
                let always = if operator.starts_with('!') { "true" } else { "false" };
                diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::NanComparison,
                    format!(
                        "Comparison with NaN using the \"{}\" operator here is always {}",
                        operator, always
                    ),
                    line,
                    column,
                ));
            }
        }

        true
    });
}

fn is_negative_zero(node: Node<'_>, source: &str) -> bool {
    if node.kind() != "unary_expression" {
        return false;
    }

    let negated = node
        .child_by_field_name("operator")
        .is_some_and(|op| op.kind() == "-");

    negated
        && node.child_by_field_name("argument").is_some_and(|arg| {
            arg.kind() == "number"
                && text(arg, source)
                    .parse::<f64>()
                    .is_ok_and(|value| value == 0.0)
        })
}

fn is_nan(node: Node<'_>, source: &str) -> bool {
    node.kind() == "identifier" && text(node, source) == "NaN"
}

pub(super) fn text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or_default()
}

fn snippet(node: Node<'_>, source: &str) -> String {
    let first_line = text(node, source).lines().next().unwrap_or_default().trim();
    if first_line.is_empty() {
        return node.kind().to_string();
    }
    first_line.chars().take(SNIPPET_LEN).collect()
}
