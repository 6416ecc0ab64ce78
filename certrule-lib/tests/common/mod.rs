#![allow(dead_code)]

use certrule_lib::{parse_cert, Certificate};
use std::path::PathBuf;

pub fn certs_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../tests/certs")
}

pub fn read(name: &str) -> Vec<u8> {
    let path = certs_dir().join(name);
    std::fs::read(&path).unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e))
}

pub fn load(name: &str) -> Certificate {
    parse_cert(&read(name)).unwrap_or_else(|e| panic!("failed to parse {}: {}", name, e))
}

/// 2030-03-17, inside every fixture's validity window.
pub const MID_VALIDITY: i64 = 1_900_000_000;
