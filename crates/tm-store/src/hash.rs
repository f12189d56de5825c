//! Content digest of archived run matrices.

use sha2::{Digest, Sha256};
use tm_core::{Protocol, RunRecord};

/// SHA-256 over the protocol key and the JSON form of each record, in order.
pub fn records_digest(protocol: Protocol, records: &[RunRecord]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(protocol.key().as_bytes());
    for record in records {
        let json = serde_json::to_string(record).unwrap_or_default();
        hasher.update(json.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
