use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tft_cli::{DecodeCommand, EncodeCommand, SchemaCommand};

const SCHEMA: &str = r#"{
    "id": {"fixed_len": {"shape": [], "dtype": "int64"}},
    "weights": {"fixed_len": {"shape": [2], "dtype": "float"}},
    "tags": {"var_len": {"dtype": "string"}},
    "clicks": {"sparse": {"index_key": "idx", "value_key": "val", "dtype": "float", "size": 100}}
}"#;

fn write_schema(dir: &Path) -> PathBuf {
    let path = dir.join("schema.json");
    fs::write(&path, SCHEMA).unwrap();
    path
}

fn encode(dir: &Path, lines: &[Value], skip_malformed: bool) -> anyhow::Result<PathBuf> {
    let input = dir.join("instances.jsonl");
    let text: Vec<String> = lines.iter().map(Value::to_string).collect();
    fs::write(&input, text.join("\n") + "\n").unwrap();

    let output = dir.join("records.tfrecord");
    EncodeCommand {
        schema: write_schema(dir),
        input,
        output: output.clone(),
        skip_malformed,
    }
    .run()?;
    Ok(output)
}

fn decode(dir: &Path, input: PathBuf) -> Vec<Value> {
    let output = dir.join("decoded.jsonl");
    DecodeCommand {
        schema: write_schema(dir),
        input,
        output: Some(output.clone()),
        skip_malformed: false,
        no_verify_crc: false,
    }
    .run()
    .unwrap();
    fs::read_to_string(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_encode_then_decode() {
    let dir = tempfile::tempdir().unwrap();
    let instances = vec![
        json!({
            "id": 1,
            "weights": [0.5, 1.5],
            "tags": ["x", "y"],
            "clicks": {"values": [2.0], "indices": [7]},
        }),
        json!({
            "id": 2,
            "weights": [0.25, 4],
            "clicks": {"values": [], "indices": []},
        }),
    ];
    let records = encode(dir.path(), &instances, false).unwrap();

    let decoded = decode(dir.path(), records);
    assert_eq!(
        decoded,
        vec![
            json!({
                "id": 1,
                "weights": [0.5, 1.5],
                "tags": ["x", "y"],
                "clicks": {"values": [2.0], "indices": [7]},
            }),
            json!({
                "id": 2,
                "weights": [0.25, 4.0],
                "tags": [],
                "clicks": {"values": [], "indices": []},
            }),
        ]
    );
}

#[test]
fn test_malformed_line_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let instances = vec![
        json!({"id": 1, "weights": [1, 2], "clicks": {"values": [], "indices": []}}),
        json!({"id": 2, "weights": [1, 2, 3], "clicks": {"values": [], "indices": []}}),
    ];
    let err = encode(dir.path(), &instances, false).unwrap_err();
    assert!(format!("{err:#}").contains("line 2"));
}

#[test]
fn test_malformed_line_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let instances = vec![
        json!({"id": 1, "weights": [1, 2], "clicks": {"values": [], "indices": []}}),
        json!({"weights": [1, 2], "clicks": {"values": [], "indices": []}}),
        json!({"id": 3, "weights": [1, 2], "clicks": {"values": [1], "indices": [100]}}),
        json!({"id": 4, "weights": [1, 2], "clicks": {"values": [], "indices": []}}),
    ];
    let records = encode(dir.path(), &instances, true).unwrap();

    let ids: Vec<Value> = decode(dir.path(), records)
        .into_iter()
        .map(|v| v["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(1), json!(4)]);
}

#[test]
fn test_schema_command_rejects_invalid_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{"a": {"var_len": {"dtype": "complex"}}}"#).unwrap();

    let result = SchemaCommand {
        schema: path,
        json: false,
    }
    .run();
    assert!(result.is_err());

    let ok = SchemaCommand {
        schema: write_schema(dir.path()),
        json: true,
    }
    .run();
    assert!(ok.is_ok());
}

#[test]
fn test_non_utf8_bytes_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let instance = json!({
        "id": 5,
        "weights": [1.0, 2.0],
        "tags": [{"base64": "/wA="}, "plain"],
        "clicks": {"values": [], "indices": []},
    });
    let records = encode(dir.path(), &[instance.clone()], false).unwrap();

    let decoded = decode(dir.path(), records);
    assert_eq!(decoded, vec![instance]);
}
