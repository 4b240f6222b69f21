// Batch id Port
// Every batch is tagged with an id that shows up in logs and outcomes

use std::sync::atomic::{AtomicU64, Ordering};

pub trait IdProvider: Send + Sync {
    fn generate_id(&self) -> String;
}

/// Random uuid v4 ids
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// `batch-1`, `batch-2`, ... for deterministic tests
#[derive(Default)]
pub struct SequentialIdProvider {
    counter: AtomicU64,
}

impl IdProvider for SequentialIdProvider {
    fn generate_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("batch-{}", n)
    }
}
