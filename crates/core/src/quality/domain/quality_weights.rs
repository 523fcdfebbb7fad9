use serde::{Deserialize, Serialize};

use crate::shared::grouping_config::ConfigError;

const SUM_TOLERANCE: f64 = 1e-6;

/// Convex weighting of the per-face quality metrics.
///
/// Centeredness dominates, then sharpness, then pose/confidence/area, with
/// brightness and contrast as minor tie-breakers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub centeredness: f64,
    pub sharpness: f64,
    pub pose: f64,
    pub confidence: f64,
    pub area: f64,
    pub contrast: f64,
    pub brightness: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            centeredness: 0.35,
            sharpness: 0.25,
            pose: 0.15,
            confidence: 0.10,
            area: 0.10,
            contrast: 0.025,
            brightness: 0.025,
        }
    }
}

impl QualityWeights {
    fn values(&self) -> [(&'static str, f64); 7] {
        [
            ("centeredness", self.centeredness),
            ("sharpness", self.sharpness),
            ("pose", self.pose),
            ("confidence", self.confidence),
            ("area", self.area),
            ("contrast", self.contrast),
            ("brightness", self.brightness),
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, w) in self.values() {
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "quality weight '{name}' must be a non-negative number, got {w}"
                )));
            }
        }
        let sum: f64 = self.values().iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(ConfigError::Invalid(format!(
                "quality weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}
