//! tft CLI Library
//!
//! Command-line access to schema-driven `tf.Example` coders:
//!
//! - **Schema**: Validate a schema document and show its wire layout
//! - **Decode**: Decode a TFRecord file into JSON lines
//! - **Encode**: Encode JSON lines into a TFRecord file
//!
//! # Example
//!
//! ```bash
//! tft schema --schema schema.json
//! tft encode --schema schema.json --input instances.jsonl --output records.tfrecord
//! tft decode --schema schema.json --input records.tfrecord
//! ```

pub mod commands;
pub mod json;

use clap::{Parser, Subcommand};

pub use commands::{DecodeCommand, EncodeCommand, SchemaCommand};

/// tft - Schema-driven tf.Example record coders
#[derive(Parser, Debug)]
#[command(name = "tft")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a schema and print its features and wire fields
    Schema(SchemaCommand),

    /// Decode a TFRecord file of tf.Example records into JSON lines
    Decode(DecodeCommand),

    /// Encode JSON lines into a TFRecord file of tf.Example records
    Encode(EncodeCommand),
}
