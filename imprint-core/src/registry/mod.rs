//! Protection registry: the authoritative mapping from content identifier
//! to ownership, watermark, and fingerprint.
//!
//! The registry enforces the engine's transactional invariants:
//!
//! - record storage and index mutation commit together or not at all; a
//!   partially registered record is never observable,
//! - writes to the same identifier are serialized (single writer per
//!   identifier); writes to different identifiers proceed in parallel,
//! - reads observe a consistent snapshot of store + index,
//! - transient storage failures are retried a bounded number of times, then
//!   surfaced as fatal,
//! - audit events are emitted only after a successful commit.

pub mod capabilities;
pub mod record;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::codec::payload::PAYLOAD_BITS;
use crate::config::EngineConfig;
use crate::error::{ImprintError, Result};
use crate::matcher::{Fingerprint, FingerprintMatcher};

use capabilities::{
    AuditSink, ContentHasher, IdentifierMinter, RecordStore, StoreError, TracingAuditSink,
    MemoryStore, Sha3ContentHasher, UuidMinter,
};
use record::{
    AuditEvent, AuditEventKind, ContentRecord, ContentStatus, Match, MatchKind, Receipt,
    VerificationResult,
};

/// The protection registry. Owns the record store handle and drives all
/// similarity-index mutation through the matcher; state is explicit and
/// passed by handle, never ambient.
pub struct ProtectionRegistry {
    store: Arc<dyn RecordStore>,
    hasher: Arc<dyn ContentHasher>,
    minter: Arc<dyn IdentifierMinter>,
    audit: Arc<dyn AuditSink>,
    matcher: FingerprintMatcher,
    /// Per-identifier write locks: single-writer-per-identifier discipline.
    locks: DashMap<String, Arc<Mutex<()>>>,
    /// Commit guard making store + index mutation atomic to readers.
    commit: RwLock<()>,
    config: EngineConfig,
}

impl ProtectionRegistry {
    /// Registry with in-memory defaults for every capability.
    pub fn new(matcher: FingerprintMatcher, config: EngineConfig) -> Self {
        Self::with_capabilities(
            matcher,
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(Sha3ContentHasher),
            Arc::new(UuidMinter),
            Arc::new(TracingAuditSink),
        )
    }

    /// Registry over caller-supplied capabilities.
    pub fn with_capabilities(
        matcher: FingerprintMatcher,
        config: EngineConfig,
        store: Arc<dyn RecordStore>,
        hasher: Arc<dyn ContentHasher>,
        minter: Arc<dyn IdentifierMinter>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store,
            hasher,
            minter,
            audit,
            matcher,
            locks: DashMap::new(),
            commit: RwLock::new(()),
            config,
        }
    }

    /// Rebuild registry state from snapshot records: loads the store and
    /// re-indexes the fingerprints of every `Active` record.
    pub fn restore(
        matcher: FingerprintMatcher,
        config: EngineConfig,
        records: Vec<ContentRecord>,
    ) -> Result<Self> {
        let registry = Self::with_capabilities(
            matcher,
            config,
            Arc::new(MemoryStore::from_records(records.clone())),
            Arc::new(Sha3ContentHasher),
            Arc::new(UuidMinter),
            Arc::new(TracingAuditSink),
        );
        for record in records {
            if record.status == ContentStatus::Active {
                registry.matcher.index().insert(
                    &record.identifier,
                    record.fingerprint.clone(),
                    record.registered_at,
                )?;
            }
        }
        Ok(registry)
    }

    /// The matcher (and similarity index) attached to this registry.
    pub fn matcher(&self) -> &FingerprintMatcher {
        &self.matcher
    }

    /// Mint a fresh globally-unique identifier. The engine mints before
    /// embedding so the watermark can carry the identifier; `register_as`
    /// later binds it.
    pub fn mint_identifier(&self) -> String {
        self.minter.mint()
    }

    /// Register content under a freshly minted identifier.
    ///
    /// `source` is the canonical pixel data as submitted, `distributed` the
    /// canonical watermarked pixel data handed back to the owner.
    pub fn register(
        &self,
        source: &[u8],
        distributed: &[u8],
        fingerprint: Fingerprint,
        owner: &str,
    ) -> Result<Receipt> {
        let identifier = self.minter.mint();
        self.register_as(&identifier, source, distributed, fingerprint, owner)
    }

    /// Register content under a pre-minted identifier.
    ///
    /// Atomically recomputes both content hashes, rejects hash and
    /// identifier conflicts, persists the record, inserts the fingerprint
    /// into the index, and emits a `Registered` audit event. On any failure
    /// no partial state remains and no event is emitted.
    pub fn register_as(
        &self,
        identifier: &str,
        source: &[u8],
        distributed: &[u8],
        fingerprint: Fingerprint,
        owner: &str,
    ) -> Result<Receipt> {
        if identifier.is_empty() {
            return Err(ImprintError::InvalidContent("empty identifier".into()));
        }
        let guard = self.lock_for(identifier);
        let _serialized = guard.lock().expect("identifier lock poisoned");

        let source_hash = self.hasher.digest(source);
        let content_hash = self.hasher.digest(distributed);

        let index = self.matcher.index();
        if fingerprint.dimension() != index.dimension() {
            return Err(ImprintError::DimensionMismatch {
                expected: index.dimension(),
                got: fingerprint.dimension(),
            });
        }

        let registered_at = Utc::now().timestamp_millis();
        let record = ContentRecord {
            identifier: identifier.to_string(),
            source_hash,
            content_hash,
            payload_bits: PAYLOAD_BITS as u32,
            fingerprint: fingerprint.clone(),
            owner: owner.to_string(),
            registered_at,
            status: ContentStatus::Active,
            revision: 0,
        };

        {
            // Uniqueness checks run inside the commit section: racing
            // registrations of the same source carry distinct identifiers,
            // so the per-identifier locks do not serialize them.
            let _commit = self.commit.write().expect("commit guard poisoned");
            if self.with_retry("get", || self.store.get(identifier))?.is_some() {
                return Err(ImprintError::DuplicateIdentifier(identifier.to_string()));
            }
            if let Some(existing) = self.with_retry("active_by_source_hash", || {
                self.store.active_by_source_hash(&source_hash)
            })? {
                return Err(ImprintError::AlreadyRegistered {
                    identifier: existing,
                });
            }
            index.insert(identifier, fingerprint, registered_at)?;
            if let Err(err) = self.try_put(record) {
                // Roll the index back so the failed registration leaves no
                // partial state.
                index.remove(identifier);
                return Err(err);
            }
        }

        debug!(identifier, owner, hash = %content_hash, "registered content");
        self.audit.emit(AuditEvent {
            event: AuditEventKind::Registered,
            identifier: identifier.to_string(),
            timestamp: registered_at,
            actor: owner.to_string(),
        });

        Ok(Receipt {
            identifier: identifier.to_string(),
            revision: 0,
            status: ContentStatus::Active,
            timestamp: registered_at,
        })
    }

    /// Verify submitted content against the registry.
    ///
    /// The watermark path is authoritative and takes precedence; the
    /// fingerprint path is the probabilistic fallback.
    pub fn verify(
        &self,
        extracted: Option<&str>,
        content: &[u8],
        fingerprint: &Fingerprint,
    ) -> Result<VerificationResult> {
        let _snapshot = self.commit.read().expect("commit guard poisoned");

        if let Some(identifier) = extracted {
            if let Some(record) = self.with_retry("get", || self.store.get(identifier))? {
                let content_hash = self.hasher.digest(content);
                if record.content_hash == content_hash {
                    return Ok(VerificationResult::Verified {
                        identifier: record.identifier,
                        owner: record.owner,
                        registered_at: record.registered_at,
                        status: record.status,
                    });
                }
                debug!(identifier, "watermark resolved but content hash differs");
            }
        }

        let hits = self
            .matcher
            .index()
            .query(fingerprint, 1, self.config.verify_threshold);
        match hits.into_iter().next() {
            Some(hit) => Ok(VerificationResult::PartialMatch {
                identifier: hit.identifier,
                similarity: hit.similarity,
            }),
            None => Ok(VerificationResult::NotFound),
        }
    }

    /// Change a record's status. Owner-only; bumps the revision counter and
    /// keeps the similarity index consistent with the new status.
    pub fn update_status(
        &self,
        identifier: &str,
        status: ContentStatus,
        requester: &str,
    ) -> Result<Receipt> {
        let guard = self.lock_for(identifier);
        let _serialized = guard.lock().expect("identifier lock poisoned");

        let record = self
            .with_retry("get", || self.store.get(identifier))?
            .ok_or_else(|| ImprintError::NotFound(identifier.to_string()))?;

        if record.owner != requester {
            return Err(ImprintError::Unauthorized {
                identifier: identifier.to_string(),
                requester: requester.to_string(),
            });
        }

        let now = Utc::now().timestamp_millis().max(record.registered_at);
        if record.status == status {
            // Idempotent: no revision bump, no audit event.
            return Ok(Receipt {
                identifier: identifier.to_string(),
                revision: record.revision,
                status,
                timestamp: now,
            });
        }

        let mut updated = record;
        updated.revision += 1;
        updated.status = status;
        let revision = updated.revision;
        let fingerprint = updated.fingerprint.clone();
        let registered_at = updated.registered_at;

        {
            let _commit = self.commit.write().expect("commit guard poisoned");
            let index = self.matcher.index();
            match status {
                // Revoked records stop contributing future matches; the
                // watermark stays embedded in already-distributed copies.
                // Put first: the remove is infallible, so a failed put
                // leaves the index untouched.
                ContentStatus::Revoked => {
                    self.try_put(updated)?;
                    index.remove(identifier);
                }
                // Reactivation mirrors registration: insert first, roll the
                // index back if the put fails.
                ContentStatus::Active => {
                    index.remove(identifier);
                    index.insert(identifier, fingerprint, registered_at)?;
                    if let Err(err) = self.try_put(updated) {
                        index.remove(identifier);
                        return Err(err);
                    }
                }
            }
        }

        debug!(identifier, %status, revision, "status updated");
        self.audit.emit(AuditEvent {
            event: AuditEventKind::StatusChanged,
            identifier: identifier.to_string(),
            timestamp: now,
            actor: requester.to_string(),
        });

        Ok(Receipt {
            identifier: identifier.to_string(),
            revision,
            status,
            timestamp: now,
        })
    }

    /// Scan for matches against the registered corpus.
    ///
    /// The watermark check runs first when an identifier was extracted; the
    /// fingerprint query always runs over the full active index. Results
    /// are deduplicated by identifier and ordered with every `Exact` match
    /// before any `Similar` match.
    pub fn detect(
        &self,
        fingerprint: &Fingerprint,
        extracted: Option<&str>,
    ) -> Result<Vec<Match>> {
        let _snapshot = self.commit.read().expect("commit guard poisoned");

        let mut matches = Vec::new();
        let mut seen = HashSet::new();

        if let Some(identifier) = extracted {
            if let Some(record) = self.with_retry("get", || self.store.get(identifier))? {
                seen.insert(record.identifier.clone());
                matches.push(Match {
                    identifier: record.identifier,
                    kind: MatchKind::Exact,
                    similarity: None,
                    owner: record.owner,
                    registered_at: record.registered_at,
                    status: record.status,
                });
            }
        }

        let hits = self
            .matcher
            .index()
            .query(fingerprint, self.config.query_k, self.config.detect_threshold);
        for hit in hits {
            if !seen.insert(hit.identifier.clone()) {
                continue;
            }
            let Some(record) = self.with_retry("get", || self.store.get(&hit.identifier))? else {
                continue;
            };
            matches.push(Match {
                identifier: record.identifier,
                kind: MatchKind::Similar,
                similarity: Some(hit.similarity),
                owner: record.owner,
                registered_at: record.registered_at,
                status: record.status,
            });
        }

        Ok(matches)
    }

    /// Fetch a record by identifier.
    pub fn get_record(&self, identifier: &str) -> Result<ContentRecord> {
        self.with_retry("get", || self.store.get(identifier))?
            .ok_or_else(|| ImprintError::NotFound(identifier.to_string()))
    }

    /// All records, for snapshots.
    pub fn records(&self) -> Result<Vec<ContentRecord>> {
        self.with_retry("records", || self.store.records())
    }

    fn lock_for(&self, identifier: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(identifier.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn try_put(&self, record: ContentRecord) -> Result<()> {
        self.with_retry("put", || self.store.put(record.clone()))
    }

    /// Run a store operation, retrying transient failures up to the
    /// configured bound before surfacing a fatal `Storage` error.
    fn with_retry<T>(
        &self,
        op_name: &str,
        mut op: impl FnMut() -> std::result::Result<T, StoreError>,
    ) -> Result<T> {
        let mut attempt = 0u32;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.config.max_store_retries => {
                    attempt += 1;
                    warn!(
                        op = op_name,
                        attempt,
                        error = err.message(),
                        "transient storage failure, retrying"
                    );
                }
                Err(err) => {
                    return Err(ImprintError::Storage(format!(
                        "{op_name}: {}",
                        err.message()
                    )))
                }
            }
        }
    }
}
