//! Registry data model: records, receipts, results, and audit events.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::matcher::Fingerprint;

/// Cryptographic digest of canonical pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Canonical byte form of an image for content hashing: dimensions followed
/// by raw RGB8 pixel data. The registry always recomputes hashes from this
/// form; caller-supplied digests are never trusted.
pub fn canonical_pixel_bytes(image: &DynamicImage) -> Vec<u8> {
    let rgb = image.to_rgb8();
    let mut bytes = Vec::with_capacity(8 + rgb.as_raw().len());
    bytes.extend_from_slice(&rgb.width().to_be_bytes());
    bytes.extend_from_slice(&rgb.height().to_be_bytes());
    bytes.extend_from_slice(rgb.as_raw());
    bytes
}

/// Lifecycle status of a content record. Records are never deleted;
/// revocation is a status flag that preserves audit history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentStatus {
    Active,
    Revoked,
}

impl std::fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentStatus::Active => f.write_str("active"),
            ContentStatus::Revoked => f.write_str("revoked"),
        }
    }
}

/// Authoritative record binding watermark, fingerprint, and ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Opaque unique identifier, immutable once assigned.
    pub identifier: String,
    /// Digest of the canonical pixel data as submitted for registration,
    /// before watermarking. Guards against re-registering the same source
    /// content.
    pub source_hash: ContentHash,
    /// Digest of the canonical watermarked pixel data, the content as
    /// distributed. Exact verification matches against this.
    pub content_hash: ContentHash,
    /// Size in bits of the embedded watermark payload (identifier + FEC).
    pub payload_bits: u32,
    /// Perceptual fingerprint of the watermarked content.
    pub fingerprint: Fingerprint,
    /// Opaque principal id of the owner.
    pub owner: String,
    /// Ledger-assigned registration timestamp (Unix ms). Never decreases
    /// across revisions.
    pub registered_at: i64,
    pub status: ContentStatus,
    /// Monotonic revision counter; bumped by every status change.
    pub revision: u64,
}

/// Result of a mutating registry operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub identifier: String,
    pub revision: u64,
    pub status: ContentStatus,
    /// Unix ms at which the operation committed.
    pub timestamp: i64,
}

/// Outcome of content verification.
///
/// Watermark-based verification takes precedence over fingerprint-based
/// verification: it is exact where the fingerprint path is probabilistic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VerificationResult {
    /// The extracted identifier resolved and the recomputed content hash
    /// matched the record. A revoked record still verifies; callers observe
    /// it through `status`.
    Verified {
        identifier: String,
        owner: String,
        registered_at: i64,
        status: ContentStatus,
    },
    /// No authoritative watermark match, but the fingerprint search found a
    /// sufficiently similar registered work. Non-authoritative.
    PartialMatch {
        identifier: String,
        similarity: f32,
    },
    /// Neither the watermark nor the fingerprint matched anything.
    NotFound,
}

/// How a detection match was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    /// Watermark extraction + registry lookup (authoritative).
    Exact,
    /// Fingerprint nearest-neighbor above the detection threshold.
    Similar,
}

/// One detection result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub identifier: String,
    pub kind: MatchKind,
    /// Fingerprint similarity; `None` for watermark matches, which carry no
    /// meaningful score.
    pub similarity: Option<f32>,
    pub owner: String,
    pub registered_at: i64,
    pub status: ContentStatus,
}

/// Kind of audit-trail event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEventKind {
    Registered,
    StatusChanged,
}

/// Audit-trail entry, emitted only after a successful commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event: AuditEventKind,
    pub identifier: String,
    /// Unix ms.
    pub timestamp: i64,
    /// Principal that caused the event.
    pub actor: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    #[test]
    fn canonical_bytes_include_dimensions() {
        let a = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(4, 2, Rgb([7, 7, 7])));
        let b = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(2, 4, Rgb([7, 7, 7])));
        assert_ne!(canonical_pixel_bytes(&a), canonical_pixel_bytes(&b));
    }

    #[test]
    fn content_hash_displays_as_hex() {
        let hash = ContentHash([0xAB; 32]);
        assert_eq!(hash.to_string(), "ab".repeat(32));
    }
}
