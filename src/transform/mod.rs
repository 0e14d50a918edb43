//! JavaScript transformation capability
//!
//! The build only needs two things from a JavaScript engine: a list of
//! diagnostics for a piece of source (syntax errors, unsupported syntax for a
//! target, suspicious constructs) and a size-reduced rendering of it. Both go
//! through the [`Transformer`] trait so a richer engine can be plugged in.
//!
//! [`JsTransformer`] is the bundled implementation, built on tree-sitter.

mod es5;
mod js;
mod minify;

pub use js::JsTransformer;

use std::fmt;

/// Language level the output must run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    /// ES5 - anything newer is reported as unsupported
    Es5,
    /// No syntax restrictions
    #[default]
    EsNext,
}

/// Options for a single transform call
///
/// The three minification passes are independent requests; an engine
/// applies the ones it supports and echoes the source when none is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransformOptions {
    /// Syntax level to validate against
    pub target: Target,

    /// Drop comments and whitespace
    pub minify_whitespace: bool,

    /// Shorten local identifiers
    pub minify_identifiers: bool,

    /// Rewrite syntax into shorter equivalents
    pub minify_syntax: bool,

    /// Keep `/*!`, `@license` and `@preserve` comments while minifying
    pub keep_legal_comments: bool,
}

impl TransformOptions {
    /// Validation only, against ES5
    pub fn validate_es5() -> Self {
        Self {
            target: Target::Es5,
            ..Self::default()
        }
    }

    /// Full minification with no target restriction
    pub fn minify() -> Self {
        Self {
            target: Target::EsNext,
            minify_whitespace: true,
            minify_identifiers: true,
            minify_syntax: true,
            keep_legal_comments: true,
        }
    }

    /// Drop legal comments as well
    pub fn without_legal_comments(mut self) -> Self {
        self.keep_legal_comments = false;
        self
    }

    /// True if any minification pass is requested
    pub fn is_minifying(&self) -> bool {
        self.minify_whitespace || self.minify_identifiers || self.minify_syntax
    }
}

/// Result of a transform call
#[derive(Debug, Clone, Default)]
pub struct TransformOutput {
    /// Transformed code (the input unchanged when not minifying or on error)
    pub code: String,

    /// Everything the engine reported
    pub diagnostics: Vec<Diagnostic>,
}

impl TransformOutput {
    /// Diagnostics with error severity
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// True if any error was reported
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

/// A JavaScript engine
pub trait Transformer: Send + Sync {
    /// Parse `source`, report diagnostics and (optionally) minify it
    fn transform(&self, source: &str, options: &TransformOptions) -> TransformOutput;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// What a diagnostic is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Source does not parse
    Syntax,
    /// Syntax newer than the requested target
    UnsupportedFeature,
    /// `x === -0` also matches `0`
    NegativeZeroComparison,
    /// `x === NaN` is constant
    NanComparison,
}

/// A single engine message with its location (1-based line and column)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
            line,
            column,
        }
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}:{}: {}: {}", self.line, self.column, severity, self.message)
    }
}
