//! Whitespace and comment minification
//!
//! Re-emits the leaf tokens of a parsed program with the least separation
//! that keeps them distinct. A line break between two tokens is kept only
//! where automatic semicolon insertion could depend on it; a comment that
//! contained a line break counts as one.

use super::js::visit;
use tree_sitter::Node;

/// Nodes emitted verbatim without descending into them
const ATOMIC_KINDS: &[&str] = &[
    "string",
    "template_string",
    "regex",
    "number",
    "comment",
    "html_comment",
    "hash_bang_line",
];

/// Tokens after which a line break can never end a statement
const NO_BREAK_AFTER: &[&str] = &[
    ";", "{", "(", "[", ",", ".", "?", ":", "=", "=>", "==", "===", "!=", "!==", "<", ">", "<=",
    ">=", "+", "-", "*", "/", "%", "&", "|", "^", "&&", "||", "!", "~", "<<", ">>", ">>>", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=",
];

/// Tokens that never start a statement, so a preceding break is not needed
///
/// `else` is not listed: `if (x) f()\nelse g()` needs its break. See
/// [`Token::closes_block_before`].
const NO_BREAK_BEFORE: &[&str] = &[";", ")", "]", "}", ",", ".", ":", "catch", "finally"];

struct Token<'a> {
    text: &'a str,
    kind: &'static str,
    start: usize,
    end: usize,
    /// An `else` whose `if` body is a block, so nothing before it relies on
    /// an implied semicolon
    closes_block_before: bool,
}

impl Token<'_> {
    fn ends_line(&self) -> bool {
        self.text.starts_with("//") || self.kind == "hash_bang_line" || self.kind == "html_comment"
    }
}

pub(super) fn minify(root: Node<'_>, source: &str, keep_legal_comments: bool) -> String {
    let tokens = collect_tokens(root, source, keep_legal_comments);
    let mut out = String::with_capacity(source.len());
    let mut prev: Option<&Token<'_>> = None;

    for token in &tokens {
        if let Some(prev) = prev {
            let gap = source.get(prev.end..token.start).unwrap_or_default();

            if prev.ends_line() || (has_line_break(gap) && line_break_matters(prev, token)) {
                out.push('\n');
            } else if needs_space(prev, token) {
                out.push(' ');
            }
        }

        out.push_str(token.text);
        prev = Some(token);
    }

    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn collect_tokens<'a>(root: Node<'_>, source: &'a str, keep_legal_comments: bool) -> Vec<Token<'a>> {
    let mut tokens = Vec::new();

    visit(root, &mut |node| {
        let kind = node.kind();
        if node.child_count() > 0 && !ATOMIC_KINDS.contains(&kind) {
            return true;
        }

        let (start, end) = (node.start_byte(), node.end_byte());
        if end > start {
            if let Some(text) = source.get(start..end) {
                if !is_comment(kind) || (keep_legal_comments && is_legal_comment(text)) {
                    tokens.push(Token {
                        text,
                        kind,
                        start,
                        end,
                        closes_block_before: kind == "else" && if_body_is_block(node),
                    });
                }
            }
        }
        false
    });

    tokens
}

/// `node` is the `else` keyword of an `if` whose consequence is `{ ... }`
fn if_body_is_block(node: Node<'_>) -> bool {
    node.parent()
        .filter(|clause| clause.kind() == "else_clause")
        .and_then(|clause| clause.parent())
        .and_then(|statement| statement.child_by_field_name("consequence"))
        .is_some_and(|body| body.kind() == "statement_block")
}

fn is_comment(kind: &str) -> bool {
    kind == "comment" || kind == "html_comment"
}

fn is_legal_comment(text: &str) -> bool {
    text.starts_with("/*!") || text.contains("@license") || text.contains("@preserve")
}

fn has_line_break(gap: &str) -> bool {
    gap.contains(['\n', '\r', '\u{2028}', '\u{2029}'])
}

fn line_break_matters(prev: &Token<'_>, next: &Token<'_>) -> bool {
    let after = NO_BREAK_AFTER.iter().any(|&t| t == prev.text);
    let before = NO_BREAK_BEFORE.iter().any(|&t| t == next.text) || next.closes_block_before;
    !(after || before)
}

fn needs_space(prev: &Token<'_>, next: &Token<'_>) -> bool {
    let (Some(a), Some(b)) = (prev.text.chars().last(), next.text.chars().next()) else {
        return false;
    };

    if is_word_char(a) && is_word_char(b) {
        return true;
    }

    // `a - -b`, `a + ++b`
    if (a == '+' || a == '-') && b == a {
        return true;
    }

    // Would start a comment
    if a == '/' && (b == '/' || b == '*') {
        return true;
    }

    // `1 .toString()`
    if prev.kind == "number" && b == '.' && prev.text.bytes().all(|c| c.is_ascii_digit()) {
        return true;
    }

    // HTML-like comment openers and closers
    (a == '<' && next.text.starts_with("!--")) || (prev.text.ends_with("--") && b == '>')
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '\\' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use crate::transform::{JsTransformer, TransformOptions, Transformer};
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn minify(source: &str) -> String {
        let output = JsTransformer::new().transform(source, &TransformOptions::minify());
        assert!(!output.has_errors(), "{:?}", output.diagnostics);
        output.code
    }

    #[test]
    fn test_minify_function() {
        let source = indoc! {"
            function Golden() {
            	console.log('hello world!');
            }
        "};
        assert_eq!(minify(source), "function Golden(){console.log('hello world!');}\n");
    }

    #[test]
    fn test_line_break_kept_where_semicolon_is_implied() {
        assert_eq!(minify("var a = 1\nvar b = 2\n"), "var a=1\nvar b=2\n");
        assert_eq!(minify("function f() {\n  return\n  x\n}\n"), "function f(){return\nx}\n");
    }

    #[test]
    fn test_comments_removed() {
        assert_eq!(minify("/* c */ var a = 1; // trailing\n"), "var a=1;\n");
    }

    #[test]
    fn test_legal_comments_kept() {
        assert_eq!(minify("/*! keep */\nvar a;\n"), "/*! keep */\nvar a;\n");
    }

    #[test]
    fn test_operators_stay_distinct() {
        assert_eq!(minify("a - -b;\n"), "a- -b;\n");
        assert_eq!(minify("x = typeof y;\n"), "x=typeof y;\n");
    }

    #[test]
    fn test_minify_is_idempotent() {
        let source = indoc! {"
            (function() {
            	try {
            		if ('Golden' in self) {
            			return true
            		}
            	} catch (err) {
            		return false;
            	}

            	return false;
            }())
        "};
        let once = minify(source);
        assert_eq!(minify(&once), once);
    }

    #[test]
    fn test_else_after_implied_semicolon_keeps_break() {
        assert_eq!(minify("if (x) f()\nelse g()\n"), "if(x)f()\nelse g()\n");
        assert_eq!(minify("if (x) y = {}\nelse z()\n"), "if(x)y={}\nelse z()\n");
        assert_eq!(minify("if (x) { f() }\nelse { g() }\n"), "if(x){f()}else{g()}\n");
    }

    fn tokens(source: &str) -> Vec<String> {
        let tree = JsTransformer::new().parse(source).unwrap();
        super::collect_tokens(tree.root_node(), source, false)
            .iter()
            .map(|t| t.text.to_string())
            .collect()
    }

    #[test]
    fn test_minified_output_reparses_to_same_tokens() {
        let corpus = [
            "if (x) f()\nelse g()\n",
            "if (x) y = {}\nelse z = function () {}\n",
            "if (a) if (b) f()\nelse g()\nelse h()\n",
            "for (var i = 0; i < n; i++) if (i) continue\nelse break\n",
            "try { f() }\ncatch (e) { g() }\nfinally { h() }\n",
            "do f()\nwhile (x)\n",
            "var a = 1\nvar b = 2\n",
            "i++\n+j\n",
            "a = b\n+c\n",
            "function f() {\n  return\n  a + b\n}\n",
            "outer: for (;;) { break outer\n}\n",
            "var n = 1\n.toString()\n",
            "a = b - -c\nd = e + +f\ng = h - --i\n",
            "x = a ? b\n: c\n",
            "var q = a / b / c\nvar r = /=/g.test(s)\n",
            "a = b\n/* multi\nline */ c()\n",
            "var o = { get a() { return 1 }, 'b': 2 }\n",
            "var t = typeof s, u = void 0, v = a instanceof B\n",
            "throw new Error('x')\n",
        ];

        for source in corpus {
            let min = minify(source);
            let output = JsTransformer::new().transform(&min, &TransformOptions::default());
            assert!(!output.has_errors(), "{:?} minified to {:?}: {:?}", source, min, output.diagnostics);
            assert_eq!(tokens(&min), tokens(source), "{:?}", source);
        }
    }

    #[test]
    fn test_legal_comments_dropped_on_request() {
        let source = "/*! keep */\nvar a;\n";
        let options = TransformOptions::minify().without_legal_comments();
        let output = JsTransformer::new().transform(source, &options);
        assert_eq!(output.code, "var a;\n");
    }

    #[test]
    fn test_strings_untouched() {
        assert_eq!(minify("var s = \"a  b\";\n"), "var s=\"a  b\";\n");
    }
}
