//! Synthetic chain metadata for demo mode.
//!
//! Nothing here corresponds to a real transaction. Every value produced is
//! tagged [`Provenance::Simulated`].

use rand::Rng;

use crate::models::{
    ActivityKind, ActivityStatus, ChainMetadata, Document, NewActivity, Provenance,
};

/// Simulated block heights start here.
pub const BASE_BLOCK_NUMBER: u64 = 4_890_000;

/// A random 32-byte `0x`-prefixed transaction hash.
pub fn transaction_hash() -> String {
    let bytes: [u8; 32] = rand::random();
    format!("0x{}", hex::encode(bytes))
}

/// Chain metadata for a newly created document. Caller-supplied values win.
pub fn upload_metadata(transaction_hash: Option<String>, document_id: Option<u64>) -> ChainMetadata {
    let mut rng = rand::thread_rng();
    ChainMetadata {
        transaction_hash: transaction_hash.unwrap_or_else(self::transaction_hash),
        block_number: BASE_BLOCK_NUMBER + rng.gen_range(0..1_000_000),
        gas_used: rng.gen_range(100_000..150_000),
        document_id: document_id.unwrap_or_else(|| rng.gen_range(1..=1000)),
        provenance: Provenance::Simulated,
    }
}

fn gas_range(kind: ActivityKind) -> std::ops::Range<u64> {
    match kind {
        ActivityKind::Upload => 100_000..150_000,
        ActivityKind::View => 15_000..25_000,
        ActivityKind::Download => 20_000..40_000,
    }
}

/// Activity for a view or download of `doc`, a few blocks after its upload.
pub fn access_activity(kind: ActivityKind, doc: &Document) -> NewActivity {
    let mut rng = rand::thread_rng();
    NewActivity {
        block_number: doc.chain.block_number + rng.gen_range(0..10),
        transaction_hash: transaction_hash(),
        gas_used: rng.gen_range(gas_range(kind)),
        status: ActivityStatus::Confirmed,
        provenance: Provenance::Simulated,
        ..NewActivity::for_document(kind, doc)
    }
}
