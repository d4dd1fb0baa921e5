use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("invalid fusion weights (semantic={semantic}, lexical={lexical}): {reason}")]
pub struct InvalidWeights {
    pub semantic: f64,
    pub lexical: f64,
    pub reason: &'static str,
}

/// Convex weights for blending the semantic and lexical scores.
///
/// Always normalized so that `semantic + lexical == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FusionWeights {
    semantic: f64,
    lexical: f64,
}

impl FusionWeights {
    /// Embedding similarity only.
    pub const SEMANTIC_ONLY: FusionWeights = FusionWeights {
        semantic: 1.0,
        lexical: 0.0,
    };

    /// 0.7 semantic + 0.3 keyword overlap.
    pub const BLENDED: FusionWeights = FusionWeights {
        semantic: 0.7,
        lexical: 0.3,
    };

    /// Named weight pairs accepted by `FUSION_PRESET`.
    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "semantic_only" | "semantic-only" => Some(Self::SEMANTIC_ONLY),
            "blended" => Some(Self::BLENDED),
            _ => None,
        }
    }

    /// Validates and normalizes a weight pair. Both must be finite and non-negative,
    /// with a positive sum.
    pub fn new(semantic: f64, lexical: f64) -> Result<Self, InvalidWeights> {
        let invalid = |reason| InvalidWeights {
            semantic,
            lexical,
            reason,
        };

        if !semantic.is_finite() || !lexical.is_finite() {
            return Err(invalid("weights must be finite"));
        }
        if semantic < 0.0 || lexical < 0.0 {
            return Err(invalid("weights must be non-negative"));
        }
        let total = semantic + lexical;
        if total <= 0.0 {
            return Err(invalid("weights must not both be zero"));
        }

        Ok(Self {
            semantic: semantic / total,
            lexical: lexical / total,
        })
    }

    pub fn semantic(&self) -> f64 {
        self.semantic
    }

    pub fn lexical(&self) -> f64 {
        self.lexical
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self::BLENDED
    }
}

/// Final ranking score: `w_s * semantic + w_l * lexical`.
pub fn fuse(semantic: f64, lexical: f64, weights: &FusionWeights) -> f64 {
    weights.semantic * semantic + weights.lexical * lexical
}
