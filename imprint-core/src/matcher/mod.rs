//! Perceptual fingerprint matcher.
//!
//! The matcher computes fixed-length, unit-norm feature vectors for raster
//! content and owns the [`SimilarityIndex`] they are searched in. Feature
//! extraction itself is a pluggable capability: any deterministic extractor
//! that is stable under small perturbations can be substituted without
//! touching matcher, codec, or registry logic.

pub mod index;

use std::sync::Arc;

use image::imageops::FilterType;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::{ImprintError, Result};
pub use index::{QueryHit, SimilarityIndex};

/// Black-box feature extraction capability.
///
/// Implementations must be deterministic for identical input and should be
/// Lipschitz-stable under small perturbations so that visually similar
/// content yields nearby vectors. Normalization is the matcher's job, not
/// the extractor's.
pub trait FeatureExtractor: Send + Sync {
    /// Fixed output dimensionality of this extractor.
    fn dimension(&self) -> usize;

    /// Raw (not yet normalized) feature vector for the image.
    fn extract(&self, image: &DynamicImage) -> Result<Vec<f32>>;
}

/// Unit-norm perceptual fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    values: Vec<f32>,
}

impl Fingerprint {
    /// Normalize a raw feature vector to unit length.
    ///
    /// # Errors
    ///
    /// [`ImprintError::InvalidContent`] for an empty or zero-norm vector.
    pub fn from_raw(mut values: Vec<f32>) -> Result<Self> {
        if values.is_empty() {
            return Err(ImprintError::InvalidContent(
                "empty feature vector".into(),
            ));
        }
        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if !(norm > 0.0) || !norm.is_finite() {
            return Err(ImprintError::InvalidContent(
                "feature vector has no usable norm".into(),
            ));
        }
        for v in values.iter_mut() {
            *v /= norm;
        }
        Ok(Self { values })
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Cosine similarity with another fingerprint; for unit vectors this is
    /// the dot product, equivalently `1 - cosine distance`.
    pub fn similarity(&self, other: &Self) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Built-in extractor: mean-centered luminance grid.
///
/// Downsamples to a `side x side` grayscale grid and subtracts the mean, so
/// uniform brightness shifts cancel out. Deterministic, cheap, and stable
/// under recompression and minor edits; production deployments substitute a
/// learned embedding behind the same trait.
#[derive(Debug, Clone)]
pub struct GridExtractor {
    side: u32,
}

impl GridExtractor {
    pub fn new(side: u32) -> Self {
        Self { side }
    }
}

impl Default for GridExtractor {
    fn default() -> Self {
        Self { side: 16 }
    }
}

impl FeatureExtractor for GridExtractor {
    fn dimension(&self) -> usize {
        (self.side * self.side) as usize
    }

    fn extract(&self, image: &DynamicImage) -> Result<Vec<f32>> {
        let gray = image
            .resize_exact(self.side, self.side, FilterType::Triangle)
            .to_luma8();
        let mut values: Vec<f32> = gray.pixels().map(|p| p.0[0] as f32).collect();
        let mean = values.iter().sum::<f32>() / values.len() as f32;
        for v in values.iter_mut() {
            *v -= mean;
        }
        Ok(values)
    }
}

/// Fingerprint computation plus index ownership.
///
/// Cheap to clone: clones share the same index and extractor.
#[derive(Clone)]
pub struct FingerprintMatcher {
    extractor: Arc<dyn FeatureExtractor>,
    index: Arc<SimilarityIndex>,
}

impl FingerprintMatcher {
    pub fn new(extractor: Arc<dyn FeatureExtractor>) -> Self {
        let index = Arc::new(SimilarityIndex::new(extractor.dimension()));
        Self { extractor, index }
    }

    /// Compute the unit-norm fingerprint of an image.
    pub fn fingerprint(&self, image: &DynamicImage) -> Result<Fingerprint> {
        let raw = self.extractor.extract(image)?;
        if raw.len() != self.extractor.dimension() {
            return Err(ImprintError::DimensionMismatch {
                expected: self.extractor.dimension(),
                got: raw.len(),
            });
        }
        Fingerprint::from_raw(raw)
    }

    /// The similarity index owned by this matcher.
    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }
}

impl Default for FingerprintMatcher {
    fn default() -> Self {
        Self::new(Arc::new(GridExtractor::default()))
    }
}
