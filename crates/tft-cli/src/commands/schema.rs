//! Schema Command Implementation
//!
//! Loads a schema document, runs full validation, and prints each feature
//! together with the wire fields it occupies.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tft_coders::{FeatureSpec, Schema, WireRole};

use super::load_schema;

/// Validate a schema and show its wire layout
///
/// # Example
///
/// ```bash
/// tft schema --schema schema.json
/// tft schema --schema schema.json --json
/// ```
#[derive(Args, Debug, Clone)]
pub struct SchemaCommand {
    /// Path to the JSON schema document
    #[arg(long, short = 's', env = "TFT_SCHEMA")]
    pub schema: PathBuf,

    /// Print the normalized schema document instead of the table
    #[arg(long)]
    pub json: bool,
}

impl SchemaCommand {
    /// Execute the schema command
    pub fn run(&self) -> Result<()> {
        let schema = load_schema(&self.schema)?;
        if self.json {
            println!("{}", schema.to_json_string_pretty()?);
        } else {
            print!("{}", render(&schema));
        }
        Ok(())
    }
}

/// One line per feature: name, kind with shape, dtype, wire fields.
pub fn render(schema: &Schema) -> String {
    let width = schema
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or_default();

    let mut out = String::new();
    for (index, (name, spec)) in schema.iter().enumerate() {
        let mut wire: Vec<(WireRole, String)> = schema
            .wire_fields()
            .filter(|(_, field)| field.feature == index)
            .map(|(wire_name, field)| {
                (
                    field.role,
                    format!("{wire_name} ({})", field.dtype.wire_kind()),
                )
            })
            .collect();
        wire.sort_by_key(|(role, _)| role_order(*role));
        let wire: Vec<String> = wire.into_iter().map(|(_, text)| text).collect();

        let _ = writeln!(
            out,
            "{name:<width$}  {:<16}  {:<5}  -> {}",
            describe(spec),
            spec.dtype().name(),
            wire.join(", ")
        );
    }
    out
}

fn describe(spec: &FeatureSpec) -> String {
    match spec {
        FeatureSpec::FixedLen { shape, .. } => format!("fixed_len{shape:?}"),
        FeatureSpec::VarLen { .. } => "var_len".to_string(),
        FeatureSpec::Sparse { size, .. } => format!("sparse[{size}]"),
    }
}

fn role_order(role: WireRole) -> u8 {
    match role {
        WireRole::Dense => 0,
        WireRole::SparseIndex => 1,
        WireRole::SparseValue => 2,
    }
}
