//! Encode Command Implementation
//!
//! Reads JSON lines, shapes each object into an instance according to the
//! schema, and writes the encoded records as a TFRecord file.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tft_coders::{ExampleCodec, TFRecordWriter};
use tracing::{info, warn};

use super::load_schema;
use crate::json::instance_from_json;

/// Encode JSON lines into a TFRecord file
///
/// # Example
///
/// ```bash
/// tft encode --schema schema.json --input instances.jsonl --output records.tfrecord
/// ```
#[derive(Args, Debug, Clone)]
pub struct EncodeCommand {
    /// Path to the JSON schema document
    #[arg(long, short = 's', env = "TFT_SCHEMA")]
    pub schema: PathBuf,

    /// JSON lines file, one instance object per line
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// TFRecord file to write
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Skip lines that fail to encode instead of aborting
    #[arg(long)]
    pub skip_malformed: bool,
}

impl EncodeCommand {
    /// Execute the encode command
    pub fn run(&self) -> Result<()> {
        let mut codec = ExampleCodec::new(load_schema(&self.schema)?);

        let input = File::open(&self.input)
            .with_context(|| format!("Failed to open {}", self.input.display()))?;
        let output = File::create(&self.output)
            .with_context(|| format!("Failed to create {}", self.output.display()))?;
        let mut writer = TFRecordWriter::new(BufWriter::new(output));

        let (mut encoded, mut skipped) = (0usize, 0usize);
        for (index, line) in BufReader::new(input).lines().enumerate() {
            let line_number = index + 1;
            let line = line.with_context(|| {
                format!("Failed to read line {line_number} of {}", self.input.display())
            })?;
            if line.trim().is_empty() {
                continue;
            }
            match encode_line(&mut codec, &line) {
                Ok(bytes) => {
                    writer.write_record(&bytes)?;
                    encoded += 1;
                }
                Err(e) if self.skip_malformed => {
                    warn!(line = line_number, error = %format!("{e:#}"), "Skipping malformed line");
                    skipped += 1;
                }
                Err(e) => return Err(e.context(format!("Failed to encode line {line_number}"))),
            }
        }
        writer.flush()?;

        info!(output = %self.output.display(), encoded, skipped, "Encode finished");
        Ok(())
    }
}

fn encode_line(codec: &mut ExampleCodec, line: &str) -> Result<Vec<u8>> {
    let value: serde_json::Value = serde_json::from_str(line).context("Invalid JSON")?;
    let instance = instance_from_json(codec.schema(), &value)?;
    Ok(codec.encode(&instance)?)
}
