//! Imprint Core - content protection engine
//!
//! This crate protects raster content against unauthorized redistribution
//! by combining three mechanisms:
//!
//! - an invisible **watermark codec** that embeds a tamper-resistant
//!   identifier into mid-frequency DCT coefficients,
//! - a **fingerprint matcher** that finds near-duplicate or edited copies
//!   of registered content by perceptual similarity,
//! - a **protection registry** that binds watermark, fingerprint, and
//!   ownership into one atomically-committed record with an audit trail.
//!
//! # Example
//!
//! ```no_run
//! use imprint_core::{EngineConfig, ProtectionEngine, VerificationResult};
//!
//! # fn example() -> imprint_core::Result<()> {
//! let engine = ProtectionEngine::new(EngineConfig::default());
//!
//! // Register: embeds a freshly minted identifier, fingerprints the
//! // watermarked pixels, and records ownership.
//! let original = image::open("artwork.png").unwrap();
//! let protected = engine.protect(&original, "alice")?;
//! println!("registered as {}", protected.receipt.identifier);
//!
//! // Verify a submitted copy: watermark first, fingerprint fallback.
//! match engine.verify(&protected.image)? {
//!     VerificationResult::Verified { owner, .. } => println!("owned by {owner}"),
//!     VerificationResult::PartialMatch { similarity, .. } => {
//!         println!("similar to a registered work ({similarity:.2})")
//!     }
//!     VerificationResult::NotFound => println!("unknown content"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod registry;

// Re-export main types for convenience
pub use codec::{embed, extract};
pub use config::EngineConfig;
pub use engine::{Protected, ProtectionEngine};
pub use error::{ImprintError, Result};
pub use matcher::{FeatureExtractor, Fingerprint, FingerprintMatcher, GridExtractor, QueryHit, SimilarityIndex};
pub use registry::capabilities::{
    AuditSink, ContentHasher, IdentifierMinter, MemoryAuditSink, MemoryStore, RecordStore,
    Sha3ContentHasher, StoreError, TracingAuditSink, UuidMinter,
};
pub use registry::record::{
    canonical_pixel_bytes, AuditEvent, AuditEventKind, ContentHash, ContentRecord, ContentStatus,
    Match, MatchKind, Receipt, VerificationResult,
};
pub use registry::ProtectionRegistry;
