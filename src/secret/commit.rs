use std::fmt;

use rand::RngCore;
use sha2::{Digest, Sha256};

/// SHA-256 of the secret, submitted during the commit phase.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommitHash([u8; 32]);

impl CommitHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitHash({})", self.to_hex())
    }
}

/// Hash of the secret's UTF-8 bytes; `None` for an empty secret.
pub fn commit_hash(secret: &str) -> Option<CommitHash> {
    if secret.is_empty() {
        return None;
    }
    let digest = Sha256::digest(secret.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    Some(CommitHash(bytes))
}

/// Bytes sent in the reveal phase: the secret exactly as stored.
pub fn reveal_payload(secret: &str) -> Vec<u8> {
    secret.as_bytes().to_vec()
}

/// Fresh 128-bit secret, hex encoded.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
