//! Shared fixtures for the client contract tests: token minting, piece
//! framing, and mock-server wiring for the three hops.

#![allow(dead_code)]

use std::io::Write;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use pieceline_client::{ClientConfig, PiecelineClient};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PIECE_FORMAT: &str = "pieces/{SubString:0,2,{TargetDigest}}/{TargetDigest}.solidpiece";

/// Mint an unsigned compact token carrying `payload`.
pub fn token(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
    format!("{header}.{body}.unsigned")
}

/// Six header bytes followed by the raw-deflated `data`.
pub fn framed_piece(data: &[u8]) -> Vec<u8> {
    let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    let mut body = vec![0x50, 0x49, 0x45, 0x43, 0x45, 0x00];
    body.extend(enc.finish().unwrap());
    body
}

/// A 32-byte digest in manifest form, distinct per `seed`.
pub fn digest(seed: u8) -> String {
    let bytes: Vec<u8> = (0..32u8).map(|i| i.wrapping_mul(31).wrapping_add(seed)).collect();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Storage path of a piece under the mock server.
pub fn piece_path(digest_b64: &str) -> String {
    let hex = pieceline_core::digest::to_hex(digest_b64).unwrap();
    format!("/direct6/pieces/{}/{hex}.solidpiece", &hex[..2])
}

pub fn client_for(server: &MockServer) -> PiecelineClient {
    let config = ClientConfig::local_mock(&server.uri()).unwrap();
    PiecelineClient::new(config).unwrap()
}

pub fn bootstrap_doc(id: &str, version: &str) -> Value {
    json!({"environments": {"production": {"id": id, "version": version}}})
}

pub fn catalog_doc(server: &MockServer) -> Value {
    json!({
        "metafile": format!("{}/meta/manifest.json", server.uri()),
        "config": {"remote": {
            "baseUrl": format!("{}/direct6/", server.uri()),
            "pieceFormat": PIECE_FORMAT
        }}
    })
}

pub fn manifest_doc(digests: &[String], files: &[(&str, u64)]) -> Value {
    let files: Vec<Value> = files
        .iter()
        .map(|(name, size)| json!({"name": name, "size": size}))
        .collect();
    json!({"pieces": {"digests": digests, "algorithm": "SHA256"}, "files": files})
}

pub async fn mount_token(server: &MockServer, at: &str, payload: &Value) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(token(payload)))
        .mount(server)
        .await;
}

/// Mount bootstrap, catalog (id `env-1`), and manifest hops.
pub async fn mount_chain(server: &MockServer, version: &str, digests: &[String], files: &[(&str, u64)]) {
    mount_token(server, "/bootstrap.json", &bootstrap_doc("env-1", version)).await;
    mount_token(server, "/catalog/env-1/catalog.json", &catalog_doc(server)).await;
    mount_token(server, "/meta/manifest.json", &manifest_doc(digests, files)).await;
}

pub async fn mount_piece(server: &MockServer, digest_b64: &str, data: &[u8], delay: Duration) {
    Mock::given(method("GET"))
        .and(path(piece_path(digest_b64)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(framed_piece(data))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}
