//! Source loading, validation and minification
//!
//! Both the polyfill body and the feature detect go through [`minify_source`]:
//! a provenance header is prepended to the raw artifact, then (unless the
//! module disables minification) the source is validated against ES5 and
//! minified. Source-map reference lines never reach either artifact.

use crate::error::{ModuleError, ModuleResult};
use crate::transform::{Diagnostic, DiagnosticKind, TransformOptions, Transformer};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

static SOURCE_MAP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^//#\s*sourceMappingURL.*$").expect("source map pattern is valid")
});

/// Raw and minified renderings of one input file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceArtifact {
    /// Source prefixed with `// <module>`
    pub raw: String,

    /// Minified source, or the source plus a newline when minification is off
    pub min: String,
}

impl SourceArtifact {
    pub fn min_len(&self) -> u64 {
        self.min.len() as u64
    }
}

/// Remove `//# sourceMappingURL=...` lines
pub fn strip_source_maps(code: &str) -> String {
    SOURCE_MAP_LINE.replace_all(code, "").into_owned()
}

/// Syntax-check `code` against ES5
///
/// Every diagnostic fails validation except the `-0` comparison warning,
/// which fires on legitimate feature detects.
pub fn validate_source(transformer: &dyn Transformer, code: &str, label: &str) -> ModuleResult<()> {
    let output = transformer.transform(code, &TransformOptions::validate_es5());

    let rejected: Vec<Diagnostic> = output
        .diagnostics
        .into_iter()
        .filter(|d| d.kind != DiagnosticKind::NegativeZeroComparison)
        .collect();

    if rejected.is_empty() {
        return Ok(());
    }

    for diagnostic in &rejected {
        warn!(source = %label, diagnostic = %diagnostic, "Source diagnostic");
    }

    Err(ModuleError::SourceValidation {
        label: label.to_string(),
        diagnostics: rejected,
    })
}

/// Produce the raw and minified artifacts for one file
pub fn minify_source(
    transformer: &dyn Transformer,
    module: &str,
    label: &str,
    source: &str,
    minify: bool,
) -> ModuleResult<SourceArtifact> {
    render(transformer, module, label, source, minify, &TransformOptions::minify())
}

fn render(
    transformer: &dyn Transformer,
    module: &str,
    label: &str,
    source: &str,
    minify: bool,
    options: &TransformOptions,
) -> ModuleResult<SourceArtifact> {
    let raw = strip_source_maps(&format!("\n// {}\n{}", module, source));

    if !minify {
        debug!(module = %module, source = %label, "Minification disabled");
        return Ok(SourceArtifact {
            raw,
            min: strip_source_maps(&format!("{}\n", source)),
        });
    }

    validate_source(transformer, source, label)?;

    let output = transformer.transform(source, options);
    if output.has_errors() {
        return Err(ModuleError::Minify {
            label: label.to_string(),
            diagnostics: output.errors().cloned().collect(),
        });
    }

    Ok(SourceArtifact {
        raw,
        min: strip_source_maps(&output.code),
    })
}

/// Read, minify and validate a feature detect, returning the stored form
///
/// The stored detect is an expression: comments (legal ones included),
/// trailing whitespace and one trailing semicolon are dropped, and it must
/// parse as the condition of an `if`. The condition is closed on its own line
/// so an unminified detect ending in a line comment still validates.
pub fn load_detect(
    transformer: &dyn Transformer,
    module: &str,
    path: &Path,
    minify: bool,
) -> ModuleResult<String> {
    let source = std::fs::read_to_string(path).map_err(|source| ModuleError::DetectRead {
        module: module.to_string(),
        path: path.to_path_buf(),
        source,
    })?;

    let label = format!("{} feature detect from {}", module, path.display());
    let options = TransformOptions::minify().without_legal_comments();
    let artifact = render(transformer, module, &label, &source, minify, &options)?;

    let trimmed = artifact.min.trim_end();
    let detect = trimmed.strip_suffix(';').unwrap_or(trimmed).to_string();

    validate_source(transformer, &format!("if ({}\n) true;", detect), &label)?;

    Ok(detect)
}

/// Read and minify a module's polyfill body
pub fn load_polyfill(
    transformer: &dyn Transformer,
    module: &str,
    path: &Path,
    minify: bool,
) -> ModuleResult<SourceArtifact> {
    let source = std::fs::read_to_string(path).map_err(|source| ModuleError::SourceRead {
        module: module.to_string(),
        path: path.to_path_buf(),
        source,
    })?;

    let label = format!("{} from {}", module, path.display());
    minify_source(transformer, module, &label, &source, minify)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::JsTransformer;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    const GOLDEN: &str = indoc! {"

        function Golden() {
        	console.log('hello world!');
        }
    "};

    #[test]
    fn test_minified_artifact() {
        let artifact = minify_source(&JsTransformer::new(), "Golden", "Golden from test", GOLDEN, true).unwrap();
        assert_eq!(artifact.raw, format!("\n// Golden\n{}", GOLDEN));
        assert_eq!(artifact.min, "function Golden(){console.log('hello world!');}\n");
        assert_eq!(artifact.min_len(), artifact.min.len() as u64);
    }

    #[test]
    fn test_minify_disabled_passes_source_through() {
        // Not ES5, but validation is skipped along with minification
        let source = "const x = () => 1;";
        let artifact = minify_source(&JsTransformer::new(), "A", "A from test", source, false).unwrap();
        assert_eq!(artifact.min, "const x = () => 1;\n");
        assert_eq!(artifact.raw, "\n// A\nconst x = () => 1;");
    }

    #[test]
    fn test_source_maps_removed() {
        let source = "var a = 1;\n//# sourceMappingURL=a.js.map\n";
        let artifact = minify_source(&JsTransformer::new(), "A", "A from test", source, true).unwrap();
        assert!(!artifact.raw.contains("sourceMappingURL"));
        assert!(!artifact.min.contains("sourceMappingURL"));
        assert_eq!(artifact.min, "var a=1;\n");
    }

    #[test]
    fn test_es2015_source_rejected() {
        let err = minify_source(&JsTransformer::new(), "A", "A from polyfill.js", "let a = 1;\n", true).unwrap_err();
        match err {
            ModuleError::SourceValidation { label, diagnostics } => {
                assert_eq!(label, "A from polyfill.js");
                assert_eq!(diagnostics.len(), 1);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_negative_zero_comparison_tolerated() {
        let source = "var isNegZero = function (x) { return x === -0 && 1 / x < 0; };\n";
        assert!(validate_source(&JsTransformer::new(), source, "A").is_ok());
    }

    #[test]
    fn test_nan_comparison_rejected() {
        let err = validate_source(&JsTransformer::new(), "if (x === NaN) {}\n", "A").unwrap_err();
        assert!(err.to_string().starts_with("Error parsing source code for A"));
    }

    #[test]
    fn test_load_detect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detect.js");
        std::fs::write(&path, "'Golden' in self;\n").unwrap();

        let detect = load_detect(&JsTransformer::new(), "Golden", &path, true).unwrap();
        assert_eq!(detect, "'Golden'in self");
    }

    #[test]
    fn test_load_detect_drops_trailing_legal_comment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detect.js");
        std::fs::write(&path, "'Golden' in self // @license MIT\n").unwrap();

        let detect = load_detect(&JsTransformer::new(), "Golden", &path, true).unwrap();
        assert_eq!(detect, "'Golden'in self");
    }

    #[test]
    fn test_unminified_detect_with_line_comment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detect.js");
        std::fs::write(&path, "'Golden' in self // simple check\n").unwrap();

        let detect = load_detect(&JsTransformer::new(), "Golden", &path, false).unwrap();
        assert_eq!(detect, "'Golden' in self // simple check");
    }

    #[test]
    fn test_polyfill_keeps_legal_comment() {
        let source = "/*! (c) Golden */\nvar a = 1;\n";
        let artifact = minify_source(&JsTransformer::new(), "A", "A from test", source, true).unwrap();
        assert_eq!(artifact.min, "/*! (c) Golden */\nvar a=1;\n");
    }

    #[test]
    fn test_load_detect_statement_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detect.js");
        std::fs::write(&path, "var a = 1;\n").unwrap();

        let err = load_detect(&JsTransformer::new(), "A", &path, true).unwrap_err();
        assert!(err.to_string().contains("A feature detect from"));
    }

    #[test]
    fn test_missing_polyfill_names_module_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("polyfill.js");

        let err = load_polyfill(&JsTransformer::new(), "A", &path, true).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("for A"));
        assert!(message.contains("polyfill.js"));
    }
}
