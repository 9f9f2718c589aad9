//! Mock distribution used by the pipeline tests.

#![allow(dead_code)]

use std::io::Write;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use pieceline_archive::ArchiveIndex;
use pieceline_client::PiecelineClient;
use pieceline_sync::{SyncConfig, SyncPipeline};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn token(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
    let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
    format!("{header}.{body}.sig")
}

pub fn framed_piece(data: &[u8]) -> Vec<u8> {
    let mut enc = DeflateEncoder::new(Vec::new(), Compression::fast());
    enc.write_all(data).unwrap();
    let mut body = vec![0u8; 6];
    body.extend(enc.finish().unwrap());
    body
}

pub fn digest(seed: u8) -> String {
    URL_SAFE_NO_PAD.encode([seed; 32])
}

pub fn piece_path(digest_b64: &str) -> String {
    let hex = pieceline_core::digest::to_hex(digest_b64).unwrap();
    format!("/cdn/pieces/{}/{hex}.solidpiece", &hex[..2])
}

async fn mount_token(server: &MockServer, at: &str, payload: Value) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(token(&payload)))
        .mount(server)
        .await;
}

/// A published distribution: ordered pieces and the file table over them.
pub struct Distribution {
    pub version: &'static str,
    pub pieces: Vec<Vec<u8>>,
    pub files: Vec<(&'static str, u64)>,
}

impl Distribution {
    pub fn digests(&self) -> Vec<String> {
        (0..self.pieces.len()).map(|i| digest(i as u8 + 1)).collect()
    }

    /// Mount the chain documents. Pieces are mounted separately so tests
    /// can set expectations on them.
    pub async fn mount_chain(&self, server: &MockServer) {
        mount_token(
            server,
            "/bootstrap.json",
            json!({"environments": {"production": {"id": "prod", "version": self.version}}}),
        )
        .await;
        mount_token(
            server,
            "/catalog/prod/catalog.json",
            json!({
                "metafile": format!("{}/meta/manifest.json", server.uri()),
                "config": {"remote": {
                    "baseUrl": format!("{}/cdn/", server.uri()),
                    "pieceFormat": "pieces/{SubString:0,2,{TargetDigest}}/{TargetDigest}.solidpiece"
                }}
            }),
        )
        .await;
        let files: Vec<Value> = self
            .files
            .iter()
            .map(|(name, size)| json!({"name": name, "size": size}))
            .collect();
        mount_token(
            server,
            "/meta/manifest.json",
            json!({"pieces": {"digests": self.digests()}, "files": files}),
        )
        .await;
    }

    /// Mount every piece, each expected to be fetched `times` times.
    pub async fn mount_pieces(&self, server: &MockServer, times: u64) {
        for (digest, data) in self.digests().iter().zip(&self.pieces) {
            Mock::given(method("GET"))
                .and(path(piece_path(digest)))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(framed_piece(data)))
                .expect(times)
                .mount(server)
                .await;
        }
    }
}

/// The stream from the partitioning example: three files over two pieces.
pub fn sample() -> Distribution {
    let stream: Vec<u8> = (0u8..40).collect();
    Distribution {
        version: "231",
        pieces: vec![stream[..25].to_vec(), stream[25..].to_vec()],
        files: vec![("discord.dll", 10), ("game/client.exe", 20), ("readme.txt", 10)],
    }
}

pub async fn pipeline(server: &MockServer, root: &std::path::Path) -> (SyncPipeline, SyncConfig) {
    let config = SyncConfig::local_mock(&server.uri(), root).unwrap();
    let client = PiecelineClient::new(config.client.clone()).unwrap();
    let archive = ArchiveIndex::open_in_memory().await.unwrap();
    (SyncPipeline::new(client, archive, &config), config)
}
