//! Checksums for resources and bag manifests.

use crate::enums::DigestAlgorithm;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::str::FromStr;

/// A declared checksum: `sha256:<hex>`, `sha512:<hex>`, or bare hex whose
/// length selects the algorithm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Checksum {
    pub algorithm: DigestAlgorithm,
    /// Lowercase hex digest.
    pub hex: String,
}

impl Checksum {
    pub fn new(algorithm: DigestAlgorithm, hex: &str) -> Result<Self, String> {
        let hex = hex.trim().to_ascii_lowercase();
        if hex.len() != algorithm.hex_len() {
            return Err(format!(
                "{} digest must have {} hex digits, found {}",
                algorithm,
                algorithm.hex_len(),
                hex.len()
            ));
        }
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("'{}' is not a hex digest", hex));
        }
        Ok(Checksum { algorithm, hex })
    }

    /// Digest `bytes` with this checksum's algorithm.
    pub fn of(algorithm: DigestAlgorithm, bytes: &[u8]) -> Self {
        Checksum {
            algorithm,
            hex: compute(algorithm, bytes),
        }
    }

    pub fn matches(&self, bytes: &[u8]) -> bool {
        compute(self.algorithm, bytes) == self.hex
    }
}

impl FromStr for Checksum {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((alg, hex)) = s.split_once(':') {
            let algorithm = DigestAlgorithm::from_name(alg)
                .ok_or_else(|| format!("unsupported checksum algorithm '{}'", alg))?;
            return Checksum::new(algorithm, hex);
        }
        let algorithm = match s.len() {
            64 => DigestAlgorithm::Sha256,
            128 => DigestAlgorithm::Sha512,
            n => {
                return Err(format!(
                    "checksum without algorithm prefix must have 64 or 128 hex digits, found {}",
                    n
                ));
            }
        };
        Checksum::new(algorithm, s)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

/// Lowercase hex digest of `bytes`.
pub fn compute(algorithm: DigestAlgorithm, bytes: &[u8]) -> String {
    match algorithm {
        DigestAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
        DigestAlgorithm::Sha512 => hex::encode(Sha512::digest(bytes)),
    }
}
