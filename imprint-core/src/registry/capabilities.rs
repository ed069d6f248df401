//! External capabilities the registry depends on by contract.
//!
//! Content hashing, record persistence, identifier minting, and the audit
//! sink are all supplied by collaborators as trait objects, so alternative
//! implementations (a real ledger client, a database-backed store, a
//! service-side minter) can be substituted without touching registry logic.
//! The in-memory defaults below back tests and the CLI.

use std::sync::Mutex;

use dashmap::DashMap;
use sha3::{Digest, Sha3_256};
use tracing::info;
use uuid::Uuid;

use crate::registry::record::{AuditEvent, ContentHash, ContentRecord};

/// Persistence-layer failure. Transient failures are retried a bounded
/// number of times by the registry; fatal failures surface immediately.
#[derive(Debug, Clone)]
pub enum StoreError {
    Transient(String),
    Fatal(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }

    pub fn message(&self) -> &str {
        match self {
            StoreError::Transient(m) | StoreError::Fatal(m) => m,
        }
    }
}

/// Content-hashing capability.
pub trait ContentHasher: Send + Sync {
    fn digest(&self, bytes: &[u8]) -> ContentHash;
}

/// SHA3-256 content hasher (default).
#[derive(Debug, Default)]
pub struct Sha3ContentHasher;

impl ContentHasher for Sha3ContentHasher {
    fn digest(&self, bytes: &[u8]) -> ContentHash {
        let mut hasher = Sha3_256::new();
        hasher.update(bytes);
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        ContentHash(out)
    }
}

/// Record persistence capability.
///
/// `put` must be atomic per record: a failed put leaves no partial state.
pub trait RecordStore: Send + Sync {
    fn get(&self, identifier: &str) -> Result<Option<ContentRecord>, StoreError>;

    /// Insert or replace the record under its identifier.
    fn put(&self, record: ContentRecord) -> Result<(), StoreError>;

    /// Identifier of the `Active` record whose source hash matches, if any.
    fn active_by_source_hash(&self, hash: &ContentHash) -> Result<Option<String>, StoreError>;

    /// All records, for snapshots and full scans.
    fn records(&self) -> Result<Vec<ContentRecord>, StoreError>;
}

/// In-memory record store (default).
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<String, ContentRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from snapshot records.
    pub fn from_records(records: impl IntoIterator<Item = ContentRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.records.insert(record.identifier.clone(), record);
        }
        store
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, identifier: &str) -> Result<Option<ContentRecord>, StoreError> {
        Ok(self.records.get(identifier).map(|r| r.clone()))
    }

    fn put(&self, record: ContentRecord) -> Result<(), StoreError> {
        self.records.insert(record.identifier.clone(), record);
        Ok(())
    }

    fn active_by_source_hash(&self, hash: &ContentHash) -> Result<Option<String>, StoreError> {
        Ok(self
            .records
            .iter()
            .find(|r| {
                r.source_hash == *hash
                    && r.status == crate::registry::record::ContentStatus::Active
            })
            .map(|r| r.identifier.clone()))
    }

    fn records(&self) -> Result<Vec<ContentRecord>, StoreError> {
        Ok(self.records.iter().map(|r| r.clone()).collect())
    }
}

/// Identifier-minting capability. Implementations must guarantee global
/// uniqueness; minted identifiers must fit the watermark payload frame.
pub trait IdentifierMinter: Send + Sync {
    fn mint(&self) -> String;
}

/// UUIDv4 minter (default). 32 hex characters: exactly the payload budget.
#[derive(Debug, Default)]
pub struct UuidMinter;

impl IdentifierMinter for UuidMinter {
    fn mint(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Audit-trail sink capability. Events arrive only after a successful
/// commit; sinks must not fail the emitting operation.
pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

/// Audit sink that logs events through `tracing` (default).
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        info!(
            event = ?event.event,
            identifier = %event.identifier,
            actor = %event.actor,
            timestamp = event.timestamp,
            "audit event"
        );
    }
}

/// Audit sink that records events in memory, for tests and inspection.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit lock poisoned").clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn emit(&self, event: AuditEvent) {
        self.events.lock().expect("audit lock poisoned").push(event);
    }
}
