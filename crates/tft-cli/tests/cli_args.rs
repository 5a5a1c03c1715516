use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use tft_cli::{Cli, Commands};

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn cli_parses_decode_flags() {
    let cli = Cli::parse_from([
        "tft",
        "decode",
        "--schema",
        "schema.json",
        "--input",
        "records.tfrecord",
        "--skip-malformed",
    ]);
    match cli.command {
        Commands::Decode(cmd) => {
            assert_eq!(cmd.schema, PathBuf::from("schema.json"));
            assert_eq!(cmd.input, PathBuf::from("records.tfrecord"));
            assert!(cmd.skip_malformed);
            assert!(!cmd.no_verify_crc);
            assert!(cmd.output.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn cli_encode_requires_output() {
    let result = Cli::try_parse_from([
        "tft",
        "encode",
        "--schema",
        "schema.json",
        "--input",
        "instances.jsonl",
    ]);
    assert!(result.is_err());
}
