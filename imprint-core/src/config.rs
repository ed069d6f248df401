//! Engine policy parameters.
//!
//! Watermark strength and similarity thresholds are policy, not protocol:
//! the defaults below are calibration starting points and every operation
//! reads them from this struct rather than from hardcoded constants.

use serde::{Deserialize, Serialize};

/// Tunable parameters for the protection engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Watermark embedding strength: the DCT coefficient delta applied per
    /// embedded bit. Larger values survive harsher recompression at the
    /// cost of visibility.
    pub strength: f32,

    /// Minimum cosine similarity for a fingerprint hit to count as a
    /// `PartialMatch` during verification.
    pub verify_threshold: f32,

    /// Minimum cosine similarity for a fingerprint hit to be reported by
    /// `detect`.
    pub detect_threshold: f32,

    /// Maximum number of fingerprint matches returned by `detect`.
    pub query_k: usize,

    /// Bounded retry count for transient storage failures before the
    /// operation surfaces a fatal `Storage` error.
    pub max_store_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strength: 25.0,
            verify_threshold: 0.92,
            detect_threshold: 0.85,
            query_k: 10,
            max_store_retries: 3,
        }
    }
}
