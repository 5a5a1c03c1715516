//! Decode Command Implementation
//!
//! Reads a TFRecord file of serialized `tf.Example` records and writes one
//! JSON object per record.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tft_coders::{ExampleCodec, TFRecordReader};
use tracing::{info, warn};

use super::load_schema;
use crate::json::instance_to_json;

/// Decode a TFRecord file into JSON lines
///
/// Byte values that are not valid UTF-8 are written as `{"base64": "..."}`
/// objects, which `tft encode` reads back unchanged.
///
/// # Example
///
/// ```bash
/// tft decode --schema schema.json --input records.tfrecord > instances.jsonl
/// ```
#[derive(Args, Debug, Clone)]
pub struct DecodeCommand {
    /// Path to the JSON schema document
    #[arg(long, short = 's', env = "TFT_SCHEMA")]
    pub schema: PathBuf,

    /// TFRecord file to decode
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Write JSON lines here instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Skip records that fail to decode instead of aborting
    #[arg(long)]
    pub skip_malformed: bool,

    /// Do not verify record checksums
    #[arg(long)]
    pub no_verify_crc: bool,
}

impl DecodeCommand {
    /// Execute the decode command
    pub fn run(&self) -> Result<()> {
        let codec = ExampleCodec::new(load_schema(&self.schema)?);

        let file = File::open(&self.input)
            .with_context(|| format!("Failed to open {}", self.input.display()))?;
        let mut reader = TFRecordReader::new(BufReader::new(file), !self.no_verify_crc);

        let mut out: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(BufWriter::new(
                File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?,
            )),
            None => Box::new(BufWriter::new(io::stdout().lock())),
        };

        let (mut decoded, mut skipped) = (0usize, 0usize);
        for (index, record) in reader.records().enumerate() {
            let record = record.with_context(|| {
                format!("Failed to read record {index} of {}", self.input.display())
            })?;
            match codec.decode(&record) {
                Ok(instance) => {
                    serde_json::to_writer(&mut out, &instance_to_json(&instance))?;
                    out.write_all(b"\n")?;
                    decoded += 1;
                }
                Err(e) if self.skip_malformed => {
                    warn!(record = index, error = %e, "Skipping malformed record");
                    skipped += 1;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to decode record {index}"))
                }
            }
        }
        out.flush()?;

        info!(input = %self.input.display(), decoded, skipped, "Decode finished");
        Ok(())
    }
}
