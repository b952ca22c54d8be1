use std::path::{Path, PathBuf};

use assert_cmd::Command;
use framecodec_core::{CapturedFrame, Codec, EncodeInput};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::{Value, json};
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("framecodec"))
}

fn arp_layers(opcode: u64) -> Value {
    json!([
        {"id": "eth", "data": {
            "dmac": "ff:ff:ff:ff:ff:ff",
            "smac": "02:00:00:00:00:01",
            "etherType": "0x0806"
        }},
        {"id": "arp", "data": {
            "opcode": opcode,
            "sender": {"mac": "02:00:00:00:00:01", "ipv4": "10.0.0.1"},
            "target": {"mac": "00:00:00:00:00:00", "ipv4": "10.0.0.2"}
        }}
    ])
}

fn write_layers(dir: &Path, layers: &Value) -> PathBuf {
    let path = dir.join("layers.json");
    std::fs::write(&path, serde_json::to_vec(layers).expect("json")).expect("write layers");
    path
}

fn write_capture(dir: &Path) -> PathBuf {
    let codec = Codec::default();
    let udp = codec
        .encode(&[
            EncodeInput::new("eth", json!({"etherType": 0x0800})),
            EncodeInput::new(
                "ipv4",
                json!({"protocol": 17, "sip": "10.0.0.1", "dip": "10.0.0.2"}),
            ),
            EncodeInput::new("udp", json!({"srcport": 5000, "dstport": 53})),
            EncodeInput::new("raw", json!({"data": "cafe"})),
        ])
        .expect("encode udp");
    let layers: Vec<EncodeInput> =
        serde_json::from_value(arp_layers(2)).expect("arp layers");
    let arp = codec.encode(&layers).expect("encode arp");

    let path = dir.join("capture.pcapng");
    framecodec_core::write_pcapng(
        &path,
        &[
            CapturedFrame::ethernet(udp.into_packet(), 1_700_000_000, 10),
            CapturedFrame::ethernet(arp.into_packet(), 1_700_000_001, 20),
        ],
    )
    .expect("write capture");
    path
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("decode").and(contains("encode")).and(contains("schema")));
    cmd().arg("dissect").arg("--help").assert().success();
}

#[test]
fn decode_stdout_outputs_layers() {
    let temp = TempDir::new().expect("tempdir");
    let capture = write_capture(temp.path());

    let assert = cmd()
        .arg("decode")
        .arg(&capture)
        .arg("--stdout")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let out: Value = serde_json::from_str(&stdout).expect("valid json");

    assert_eq!(out["summary"]["frames_total"], 2);
    assert_eq!(out["summary"]["field_errors"], 0);
    let ids: Vec<_> = out["frames"][0]["layers"]
        .as_array()
        .expect("layers")
        .iter()
        .map(|layer| layer["id"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(ids, ["eth", "ipv4", "udp", "raw"]);
    assert_eq!(out["frames"][0]["layers"][2]["data"]["dstport"], 53);
    assert_eq!(out["frames"][1]["layers"][1]["data"]["opcode"], 2);
}

#[test]
fn decode_writes_output_file() {
    let temp = TempDir::new().expect("tempdir");
    let capture = write_capture(temp.path());
    let output = temp.path().join("out").join("frames.json");

    cmd()
        .arg("decode")
        .arg(&capture)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stderr(contains("OK: 2 frames decoded"));

    let body = std::fs::read_to_string(&output).expect("output written");
    let out: Value = serde_json::from_str(&body).expect("valid json");
    assert_eq!(out["frames"].as_array().map(Vec::len), Some(2));
}

#[test]
fn quiet_suppresses_ok_message() {
    let temp = TempDir::new().expect("tempdir");
    let capture = write_capture(temp.path());
    let output = temp.path().join("frames.json");

    cmd()
        .arg("decode")
        .arg(&capture)
        .arg("-o")
        .arg(&output)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());
}

#[test]
fn decode_missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.pcapng");

    cmd()
        .arg("decode")
        .arg(missing)
        .arg("--stdout")
        .assert()
        .code(2)
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn decode_rejects_output_equal_to_input() {
    let temp = TempDir::new().expect("tempdir");
    let capture = write_capture(temp.path());

    cmd()
        .arg("decode")
        .arg(&capture)
        .arg("-o")
        .arg(&capture)
        .assert()
        .code(2)
        .stderr(contains("output path must differ from input"));
}

#[test]
fn decode_resolves_single_glob_match() {
    let temp = TempDir::new().expect("tempdir");
    write_capture(temp.path());
    let pattern = temp.path().join("*.pcapng");

    cmd()
        .arg("decode")
        .arg(pattern)
        .arg("--stdout")
        .assert()
        .success();
}

#[test]
fn stdout_and_output_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let capture = write_capture(temp.path());

    cmd()
        .arg("decode")
        .arg(&capture)
        .arg("--stdout")
        .arg("-o")
        .arg(temp.path().join("frames.json"))
        .assert()
        .failure();
}

#[test]
fn encode_prints_packet_hex() {
    let temp = TempDir::new().expect("tempdir");
    let layers = write_layers(temp.path(), &arp_layers(1));

    let assert = cmd().arg("encode").arg(&layers).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let hex = stdout.trim();
    assert_eq!(hex.len(), 84);
    assert!(hex.starts_with("ffffffffffff0200000000010806"));
    // hardware type 1, protocol 0x0800, sizes 6 and 4, opcode 1
    assert_eq!(&hex[28..44], "0001080006040001");
}

#[test]
fn encode_reports_field_errors_and_strict_fails() {
    let temp = TempDir::new().expect("tempdir");
    let layers = write_layers(temp.path(), &arp_layers(9));

    cmd()
        .arg("encode")
        .arg(&layers)
        .assert()
        .success()
        .stderr(contains("Field errors:").and(contains("arp.opcode")));

    cmd()
        .arg("encode")
        .arg(&layers)
        .arg("--strict")
        .assert()
        .code(2)
        .stderr(contains("1 field errors recorded"));
}

#[test]
fn encode_writes_pcapng_readable_by_decode() {
    let temp = TempDir::new().expect("tempdir");
    let layers = write_layers(temp.path(), &arp_layers(1));
    let capture = temp.path().join("built.pcapng");

    cmd()
        .arg("encode")
        .arg(&layers)
        .arg("--pcap")
        .arg(&capture)
        .assert()
        .success()
        .stderr(contains("capture written"));

    cmd()
        .arg("decode")
        .arg(&capture)
        .arg("--stdout")
        .assert()
        .success()
        .stdout(contains("\"id\":\"arp\""));
}

#[test]
fn encode_unknown_protocol_lists_known_ids() {
    let temp = TempDir::new().expect("tempdir");
    let layers = write_layers(temp.path(), &json!([{"id": "eth"}, {"id": "quic"}]));

    cmd()
        .arg("encode")
        .arg(&layers)
        .assert()
        .code(2)
        .stderr(contains("unknown protocol id: quic").and(contains("hint: known protocol ids")));
}

#[test]
fn encode_rejects_malformed_layer_file() {
    let temp = TempDir::new().expect("tempdir");
    let layers = temp.path().join("layers.json");
    std::fs::write(&layers, "{\"id\": \"eth\"}").expect("write");

    cmd()
        .arg("encode")
        .arg(&layers)
        .assert()
        .code(2)
        .stderr(contains("invalid layer file").and(contains("hint:")));
}

#[test]
fn schema_lists_every_protocol() {
    let assert = cmd().arg("schema").assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let schemas: Value = serde_json::from_str(&stdout).expect("valid json");
    let ids: Vec<_> = schemas
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|schema| schema["id"].as_str())
        .collect();
    assert_eq!(
        ids,
        [
            "eth",
            "vlan",
            "arp",
            "ipv4",
            "ipv6",
            "ipv6-hopopt",
            "icmp",
            "icmpv6",
            "tcp",
            "udp",
            "tls",
            "raw",
        ]
    );
}

#[test]
fn schema_for_one_protocol() {
    cmd()
        .arg("schema")
        .arg("udp")
        .arg("--pretty")
        .assert()
        .success()
        .stdout(contains("User Datagram Protocol").and(contains("dstport")));

    cmd()
        .arg("schema")
        .arg("quic")
        .assert()
        .code(2)
        .stderr(contains("unknown protocol id 'quic'"));
}
