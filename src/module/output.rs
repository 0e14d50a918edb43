//! Catalog file writing
//!
//! JSON artifacts are tab-indented, newline-terminated and keep `<`, `>` and
//! `&` literal (serde_json never HTML-escapes).

use crate::error::OutputError;
use crate::module::metadata::ModuleMeta;
use crate::module::source::SourceArtifact;
use serde::Serialize;
use std::path::Path;

/// Per-module metadata file
pub const META_FILE: &str = "meta.json";

/// Per-module source with provenance header
pub const RAW_FILE: &str = "raw.js";

/// Per-module minified source
pub const MIN_FILE: &str = "min.js";

/// Catalog-level alias index
pub const ALIAS_FILE: &str = "aliases.json";

/// Encode `value` the way every catalog JSON file is laid out
pub fn encode_json<T: Serialize>(value: &T, path: &Path) -> Result<Vec<u8>, OutputError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);

    value.serialize(&mut serializer).map_err(|source| OutputError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    buf.push(b'\n');
    Ok(buf)
}

/// Write `contents` to `path`, replacing any previous file
pub fn write_file(path: &Path, contents: &[u8]) -> Result<(), OutputError> {
    std::fs::write(path, contents).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `meta.json`, `raw.js` and `min.js` into `dir`, creating it if needed
pub fn write_module(dir: &Path, meta: &ModuleMeta, sources: &SourceArtifact) -> Result<(), OutputError> {
    std::fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let meta_path = dir.join(META_FILE);
    let encoded = encode_json(meta, &meta_path)?;

    write_file(&meta_path, &encoded)?;
    write_file(&dir.join(RAW_FILE), sources.raw.as_bytes())?;
    write_file(&dir.join(MIN_FILE), sources.min.as_bytes())?;

    Ok(())
}
