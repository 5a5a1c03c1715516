//! CLI Command Implementations
//!
//! - [`schema`]: Schema validation and inspection
//! - [`decode`]: TFRecord to JSON lines
//! - [`encode`]: JSON lines to TFRecord

mod decode;
mod encode;
mod schema;

pub use decode::DecodeCommand;
pub use encode::EncodeCommand;
pub use schema::SchemaCommand;

use std::path::Path;

use anyhow::{Context, Result};
use tft_coders::Schema;

/// Loads and validates a schema document.
fn load_schema(path: &Path) -> Result<Schema> {
    let schema = Schema::from_path(path)
        .with_context(|| format!("Failed to load schema from {}", path.display()))?;
    tracing::info!(path = %path.display(), features = schema.len(), "Loaded schema");
    Ok(schema)
}
