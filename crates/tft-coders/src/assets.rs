//! Coder assets stored alongside an exported transform function.
//!
//! The coders are written to `<transform_fn_dir>/assets.extra/tf_transform_coders`
//! as a JSON object mapping coder names to schema documents. The first coder
//! appended is also stored under the name `default`, which serving uses when
//! no coder is named.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::codec::ExampleCodec;
use crate::error::{CoderError, Result};

/// Directory under the transform function that holds extra assets.
pub const ASSETS_EXTRA: &str = "assets.extra";

/// File name of the serialized coders inside [`ASSETS_EXTRA`].
pub const CODERS_FILE_NAME: &str = "tf_transform_coders";

/// Name under which the first appended coder is also stored.
pub const DEFAULT_CODER: &str = "default";

/// A named collection of codecs read back from a transform directory.
#[derive(Debug, Clone, PartialEq)]
pub struct CoderAssets {
    coders: BTreeMap<String, ExampleCodec>,
}

impl CoderAssets {
    /// Returns the codec stored under `name`.
    pub fn get(&self, name: &str) -> Option<&ExampleCodec> {
        self.coders.get(name)
    }

    /// Returns the default codec.
    pub fn default_coder(&self) -> Option<&ExampleCodec> {
        self.get(DEFAULT_CODER)
    }

    /// Removes and returns the codec stored under `name`, ready for use.
    pub fn take(&mut self, name: &str) -> Option<ExampleCodec> {
        self.coders.remove(name)
    }

    /// Names of all stored codecs, `default` included.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.coders.keys().map(String::as_str)
    }

    /// Number of stored entries, `default` included.
    pub fn len(&self) -> usize {
        self.coders.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.coders.is_empty()
    }
}

/// Writes `coders` into `transform_fn_dir` and returns the directory.
///
/// `assets.extra` is created if needed and an existing coders file is
/// replaced. A later coder with the same name replaces an earlier one.
///
/// # Errors
///
/// Returns [`CoderError::InvalidArgument`] if `coders` is empty, and
/// [`CoderError::Io`] if the directory or file cannot be written.
pub fn append_coder_assets<'a, I>(transform_fn_dir: impl AsRef<Path>, coders: I) -> Result<PathBuf>
where
    I: IntoIterator<Item = (&'a str, &'a ExampleCodec)>,
{
    let transform_fn_dir = transform_fn_dir.as_ref();

    let mut entries: BTreeMap<&str, &ExampleCodec> = BTreeMap::new();
    let mut first = None;
    for (name, codec) in coders {
        first.get_or_insert(codec);
        entries.insert(name, codec);
    }
    let first = first.ok_or_else(|| {
        CoderError::InvalidArgument("at least one coder is required".to_string())
    })?;
    entries.insert(DEFAULT_CODER, first);

    let assets_extra = transform_fn_dir.join(ASSETS_EXTRA);
    fs::create_dir_all(&assets_extra)?;
    let path = assets_extra.join(CODERS_FILE_NAME);

    let json = serde_json::to_vec_pretty(&entries)
        .map_err(|e| CoderError::Serialization(format!("JSON serialization failed: {}", e)))?;
    fs::write(&path, json)?;

    tracing::info!(path = %path.display(), coders = entries.len(), "Wrote coder assets");
    Ok(transform_fn_dir.to_path_buf())
}

/// Reads the coders previously written by [`append_coder_assets`].
///
/// Every codec is recompiled from its schema.
pub fn read_coder_assets(transform_fn_dir: impl AsRef<Path>) -> Result<CoderAssets> {
    let path = transform_fn_dir
        .as_ref()
        .join(ASSETS_EXTRA)
        .join(CODERS_FILE_NAME);
    let data = fs::read(&path)?;
    let coders: BTreeMap<String, ExampleCodec> = serde_json::from_slice(&data)
        .map_err(|e| CoderError::Serialization(format!("JSON deserialization failed: {}", e)))?;

    tracing::info!(path = %path.display(), coders = coders.len(), "Read coder assets");
    Ok(CoderAssets { coders })
}
