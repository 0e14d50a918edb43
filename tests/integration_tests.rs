//! Integration tests for polyfill-catalog
//!
//! Every test builds a real catalog from a polyfill tree in a temporary
//! directory.

use polyfill_catalog::error::{BuildError, GraphError, ModuleError};
use polyfill_catalog::module::baselines::PlatformBaselines;
use polyfill_catalog::module::license::{LicenseInfo, LicenseRegistry};
use polyfill_catalog::{BuildConfig, BuildContext, BuildCoordinator, BuildResult};
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

const GOLDEN_CONFIG: &str = indoc! {r#"
    aliases = []
    dependencies = [
      "window"
    ]
    license = "MIT"
    docs = ""
    spec = ""

    [browsers]
    ie = "*"
    ie_mob = "10 - 11"
    safari = "<9"
    chrome = "<44"
    firefox = "<40"
    android = "*"
    ios_saf = "<9"
    opera = "<25"
    firefox_mob = "<36"
    bb = "10 - *"
"#};

const GOLDEN_SOURCE: &str = "\nfunction Golden() {\n\tconsole.log('hello world!');\n}\n";

const GOLDEN_DETECT: &str = indoc! {"
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

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self { dir: tempdir().unwrap() }
    }

    fn root(&self) -> PathBuf {
        self.dir.path().join("polyfills")
    }

    fn output(&self) -> PathBuf {
        self.root().join("__dist")
    }

    fn file(&self, relative: &str, contents: &str) -> &Self {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
        self
    }

    fn module(&self, dir: &str, config: &str, source: &str) -> &Self {
        self.file(&format!("{}/config.toml", dir), config)
            .file(&format!("{}/polyfill.js", dir), source)
    }

    fn golden(&self) -> &Self {
        self.module("Golden", GOLDEN_CONFIG, GOLDEN_SOURCE)
            .file("Golden/detect.js", GOLDEN_DETECT)
            .file("Golden/tests.js", "it('is a function', function () {});\n")
            .module("window", "", "var window = this;\n")
    }

    fn config(&self) -> BuildConfig {
        fs::create_dir_all(self.root()).unwrap();
        BuildConfig::new(self.root(), self.output()).with_workers(4)
    }

    fn build(&self) -> Result<BuildResult, BuildError> {
        BuildCoordinator::new(self.config()).run()
    }

    fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.output().join(relative)).unwrap()
    }
}

fn meta(fixture: &Fixture, module: &str) -> serde_json::Value {
    serde_json::from_str(&fixture.read(&format!("{}/meta.json", module))).unwrap()
}

/// Every file under `root`, keyed by relative path
fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e.path().strip_prefix(root).unwrap().display().to_string();
            (relative, fs::read(e.path()).unwrap())
        })
        .collect()
}

#[test]
fn test_golden_build() {
    let fixture = Fixture::new();
    fixture.golden();

    let result = fixture.build().unwrap();
    let names: Vec<&str> = result.modules.iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["Golden", "window"]);

    assert_eq!(
        fixture.read("Golden/min.js"),
        "function Golden(){console.log('hello world!');}\n"
    );
    assert_eq!(fixture.read("Golden/raw.js"), format!("\n// Golden\n{}", GOLDEN_SOURCE));

    let golden = meta(&fixture, "Golden");
    assert_eq!(golden["size"], fixture.read("Golden/min.js").len());
    assert_eq!(golden["baseDir"], "Golden");
    assert_eq!(golden["hasTests"], true);
    assert_eq!(golden["isTestable"], true);
    assert_eq!(golden["isPublic"], true);
    assert_eq!(golden["dependencies"], serde_json::json!(["window"]));
    assert_eq!(golden["license"], "MIT");
    assert_eq!(golden["browsers"]["ie_mob"], "10 - 11");

    let detect = golden["detectSource"].as_str().unwrap();
    assert!(detect.starts_with("(function(){try{if('Golden'in self){return true}}"));
    assert!(detect.ends_with("}())"));
    assert!(!detect.contains('\t'));

    assert_eq!(
        fixture.read("aliases.json"),
        "{\n\t\"all\": [\n\t\t\"Golden\",\n\t\t\"window\"\n\t]\n}\n"
    );
}

#[test]
fn test_meta_json_layout() {
    let fixture = Fixture::new();
    fixture.golden();
    fixture.build().unwrap();

    let text = fixture.read("Golden/meta.json");
    assert!(text.starts_with("{\n\t\"size\": "));
    assert!(text.ends_with("}\n"));

    let keys = [
        "size",
        "detectSource",
        "baseDir",
        "hasTests",
        "isTestable",
        "isPublic",
        "aliases",
        "dependencies",
        "spec",
        "docs",
        "license",
        "browsers",
        "test",
        "build",
    ];
    let positions: Vec<usize> = keys
        .iter()
        .map(|k| text.find(&format!("\n\t\"{}\":", k)).unwrap())
        .collect();
    let mut sorted = positions.clone();
    sorted.sort();
    assert_eq!(positions, sorted);

    // `<` stays literal
    assert!(text.contains("\"safari\": \"<9\""));
}

#[test]
fn test_inert_and_reserved_directories() {
    let fixture = Fixture::new();
    fixture
        .file("Empty/README", "not a module")
        .module("Array/from", "", "var from = 1;\n")
        .module("__fixtures/Thing", "", "var thing = 1;\n");

    let result = fixture.build().unwrap();
    let names: Vec<&str> = result.modules.iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["Array.from"]);

    // `Array` and `Empty` have no config
    assert_eq!(result.inert, 2);
    assert!(fixture.output().join("Array.from/meta.json").exists());
    assert!(!fixture.output().join("Array").exists());
    assert!(!fixture.output().join("__fixtures.Thing").exists());

    let from = meta(&fixture, "Array.from");
    assert_eq!(from["baseDir"], "Array/from");
    assert_eq!(from["detectSource"], "");
    assert_eq!(from["hasTests"], false);
}

#[test]
fn test_missing_dependency_fails_build() {
    let fixture = Fixture::new();
    fixture.module("A", "dependencies = [\"ghost\"]\n", "var a;\n");

    let err = fixture.build().unwrap_err();
    assert!(matches!(
        err,
        BuildError::Graph(GraphError::MissingDependency { ref module, ref dependency })
            if module == "A" && dependency == "ghost"
    ));
    assert!(err.to_string().contains("Polyfill A depends on ghost"));
    assert!(!fixture.output().join("aliases.json").exists());
}

#[test]
fn test_cycle_fails_build() {
    let fixture = Fixture::new();
    fixture
        .module("A", "dependencies = [\"B\"]\n", "var a;\n")
        .module("B", "dependencies = [\"A\"]\n", "var b;\n")
        .module("C", "dependencies = [\"A\"]\n", "var c;\n");

    let err = fixture.build().unwrap_err();
    assert!(matches!(err, BuildError::Graph(GraphError::CycleDetected { .. })));
    assert!(!fixture.output().join("aliases.json").exists());
}

#[test]
fn test_license_not_approved() {
    let fixture = Fixture::new();
    fixture.module("Bad", "license = \"Abstyles\"\n", "var bad;\n");

    let err = fixture.build().unwrap_err();
    assert_eq!(err.to_string(), "The license Abstyles (Bad) is not OSI approved.");
    assert!(!fixture.output().join("Bad").exists());
}

#[test]
fn test_license_unknown_and_exempt() {
    let fixture = Fixture::new();
    fixture
        .module("Zero", "license = \"CC0-1.0\"\n", "var zero;\n")
        .module("Whatever", "license = \"WTFPL\"\n", "var whatever;\n");
    assert_eq!(fixture.build().unwrap().modules.len(), 2);

    fixture.module("Unknown", "license = \"Not-A-License\"\n", "var u;\n");
    let err = fixture.build().unwrap_err();
    assert!(matches!(err, BuildError::Module(ModuleError::LicenseUnknown { .. })));
    assert!(err.to_string().contains("Not-A-License (Unknown)"));
}

struct AllowAll;

impl LicenseRegistry for AllowAll {
    fn lookup(&self, id: &str) -> Option<LicenseInfo> {
        Some(LicenseInfo {
            id: id.to_string(),
            osi_approved: true,
        })
    }
}

#[test]
fn test_injected_license_registry() {
    let fixture = Fixture::new();
    fixture.module("Bad", "license = \"Abstyles\"\n", "var bad;\n");

    let context = BuildContext::default().with_licenses(Arc::new(AllowAll));
    let result = BuildCoordinator::with_context(fixture.config(), context).run().unwrap();
    assert_eq!(result.modules.len(), 1);
}

#[test]
fn test_internal_module_policy() {
    let fixture = Fixture::new();
    fixture.module("_Internal", "[browsers]\nchrome = \"*\"\nie = \"9\"\n", "var internal;\n");

    let err = fixture.build().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Internal polyfill called _Internal is not targeting all supported browsers correctly"));
    assert!(message.contains("samsung_mob = \"*\""));

    let baselines = PlatformBaselines::new(BTreeMap::from([("chrome".to_string(), "29".to_string())]));
    let result = BuildCoordinator::new(fixture.config().with_baselines(baselines))
        .run()
        .unwrap();
    assert_eq!(meta(&fixture, "_Internal")["isPublic"], false);
    assert_eq!(result.modules.len(), 1);
}

#[test]
fn test_minify_disabled() {
    let source = "const answer = () => 42; // kept as is";
    let fixture = Fixture::new();
    fixture.module("Modern", "[build]\nminify = false\n[test]\nci = false\n", source);

    fixture.build().unwrap();
    assert_eq!(fixture.read("Modern/min.js"), format!("{}\n", source));
    assert_eq!(fixture.read("Modern/raw.js"), format!("\n// Modern\n{}", source));

    let modern = meta(&fixture, "Modern");
    assert_eq!(modern["isTestable"], false);
    assert_eq!(modern["build"]["minify"], false);
}

#[test]
fn test_invalid_source_fails_module() {
    let fixture = Fixture::new();
    fixture.module("Modern", "", "let answer = 42;\n");

    let err = fixture.build().unwrap_err();
    assert!(matches!(err, BuildError::Module(ModuleError::SourceValidation { .. })));
    assert!(err.to_string().starts_with("Error parsing source code for Modern from "));
}

fn many_modules(fixture: &Fixture, count: usize) {
    for i in 0..count {
        let deps = if i > 0 {
            format!("dependencies = [\"M{:02}\"]\n", i - 1)
        } else {
            String::new()
        };
        let aliases = format!("aliases = [\"group{}\"]\n", i % 3);
        fixture.module(
            &format!("M{:02}", i),
            &format!("{}{}", aliases, deps),
            &format!("var m{} = {};\n", i, i),
        );
    }
    fixture.file("Inert/notes.txt", "");
}

#[test]
fn test_every_candidate_produces_one_result() {
    let fixture = Fixture::new();
    many_modules(&fixture, 20);

    let result = BuildCoordinator::new(fixture.config().with_workers(3)).run().unwrap();
    assert_eq!(result.modules.len(), 20);
    assert_eq!(result.inert, 1);
    assert_eq!(result.aliases.get("all").unwrap().len(), 20);
    assert_eq!(result.aliases.get("group0").unwrap().len(), 7);
    assert!(result.module("M07").is_some());
}

#[test]
fn test_output_independent_of_worker_count() {
    let fixture = Fixture::new();
    many_modules(&fixture, 16);
    fixture.golden();

    BuildCoordinator::new(fixture.config().with_workers(1)).run().unwrap();
    let single = snapshot(&fixture.output());

    BuildCoordinator::new(fixture.config().with_workers(8)).run().unwrap();
    let parallel = snapshot(&fixture.output());

    assert_eq!(single.len(), 18 * 3 + 1);
    assert!(single == parallel);
}

#[test]
fn test_rerun_is_deterministic() {
    let fixture = Fixture::new();
    fixture.golden();

    fixture.build().unwrap();
    let first = snapshot(&fixture.output());
    fixture.build().unwrap();
    let second = snapshot(&fixture.output());

    assert!(first == second);
}

#[test]
fn test_keep_going_reports_every_failure() {
    let fixture = Fixture::new();
    fixture
        .module("A", "license = \"Abstyles\"\n", "var a;\n")
        .module("B", "", "var b;\n")
        .module("C", "", "let c = 1;\n");

    let err = BuildCoordinator::new(fixture.config().with_keep_going(true))
        .run()
        .unwrap_err();
    match err {
        BuildError::ModuleFailures(errors) => {
            assert_eq!(errors.len(), 2);
            assert_eq!(errors[0].to_string(), "The license Abstyles (A) is not OSI approved.");
            assert!(errors[1]
                .to_string()
                .starts_with("Error parsing source code for C from "));
        }
        other => panic!("expected aggregated failures, got {}", other),
    }

    // A single worker reaches A before anything is cancelled
    let err = BuildCoordinator::new(fixture.config().with_workers(1))
        .run()
        .unwrap_err();
    assert_eq!(err.to_string(), "The license Abstyles (A) is not OSI approved.");
}
