//! Engine facade composing codec, matcher, and registry.
//!
//! Implements the registration / verification / detection control flow over
//! raster content: on registration the codec embeds a newly minted
//! identifier, the matcher fingerprints the watermarked pixels, and the
//! registry binds both to the owner in one atomic commit.

use image::DynamicImage;
use tracing::debug;

use crate::codec;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::matcher::FingerprintMatcher;
use crate::registry::record::{
    canonical_pixel_bytes, ContentRecord, Match, Receipt, VerificationResult,
};
use crate::registry::ProtectionRegistry;

/// Outcome of protecting a piece of content: the watermarked image to
/// distribute, and the registration receipt.
#[derive(Debug)]
pub struct Protected {
    pub image: DynamicImage,
    pub receipt: Receipt,
}

/// The content protection engine.
pub struct ProtectionEngine {
    registry: ProtectionRegistry,
    matcher: FingerprintMatcher,
    config: EngineConfig,
}

impl ProtectionEngine {
    /// Engine over a fresh in-memory registry.
    pub fn new(config: EngineConfig) -> Self {
        let matcher = FingerprintMatcher::default();
        let registry = ProtectionRegistry::new(matcher.clone(), config.clone());
        Self {
            registry,
            matcher,
            config,
        }
    }

    /// Engine over an existing registry; the matcher is shared with it.
    pub fn with_registry(registry: ProtectionRegistry, config: EngineConfig) -> Self {
        let matcher = registry.matcher().clone();
        Self {
            registry,
            matcher,
            config,
        }
    }

    /// Restore an engine from snapshot records.
    pub fn restore(config: EngineConfig, records: Vec<ContentRecord>) -> Result<Self> {
        let matcher = FingerprintMatcher::default();
        let registry = ProtectionRegistry::restore(matcher.clone(), config.clone(), records)?;
        Ok(Self {
            registry,
            matcher,
            config,
        })
    }

    pub fn registry(&self) -> &ProtectionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Watermark and register content for an owner.
    ///
    /// Mints the identifier first so the watermark can carry it, embeds,
    /// fingerprints the watermarked pixels, and registers the result. The
    /// returned image is the copy to distribute.
    pub fn protect(&self, image: &DynamicImage, owner: &str) -> Result<Protected> {
        let identifier = self.registry.mint_identifier();
        let marked = codec::embed(image, &identifier, self.config.strength)?;
        let fingerprint = self.matcher.fingerprint(&marked)?;
        let source = canonical_pixel_bytes(image);
        let distributed = canonical_pixel_bytes(&marked);
        let receipt = self
            .registry
            .register_as(&identifier, &source, &distributed, fingerprint, owner)?;
        debug!(identifier, owner, "content protected");
        Ok(Protected {
            image: marked,
            receipt,
        })
    }

    /// Verify submitted content: watermark extraction first, fingerprint
    /// fallback second.
    pub fn verify(&self, image: &DynamicImage) -> Result<VerificationResult> {
        let extracted = codec::extract(image);
        let fingerprint = self.matcher.fingerprint(image)?;
        let content = canonical_pixel_bytes(image);
        self.registry
            .verify(extracted.as_deref(), &content, &fingerprint)
    }

    /// Scan submitted content against the registered corpus.
    pub fn detect(&self, image: &DynamicImage) -> Result<Vec<Match>> {
        let extracted = codec::extract(image);
        let fingerprint = self.matcher.fingerprint(image)?;
        self.registry.detect(&fingerprint, extracted.as_deref())
    }
}

impl Default for ProtectionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
