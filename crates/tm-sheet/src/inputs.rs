//! User-entered tire and rim parameters.

use serde::{Deserialize, Serialize};

use crate::{SheetError, SheetResult};

/// Tire/rim parameters entered alongside a protocol sheet.
///
/// Aliases accept the short form ids used by the input forms (`l1`, `p1`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TireInputs {
    #[serde(alias = "rimWidth")]
    pub rim_width: Option<f64>,
    #[serde(alias = "rimDiameter")]
    pub rim_diameter: Option<f64>,
    #[serde(alias = "nominalWidth")]
    pub nominal_width: Option<f64>,
    #[serde(alias = "outerDiameter")]
    pub outer_diameter: Option<f64>,
    #[serde(alias = "aspectRatio")]
    pub aspect_ratio: Option<f64>,
    #[serde(alias = "l1")]
    pub load1_kg: Option<f64>,
    #[serde(alias = "l2")]
    pub load2_kg: Option<f64>,
    #[serde(alias = "l3")]
    pub load3_kg: Option<f64>,
    #[serde(alias = "l4")]
    pub load4_kg: Option<f64>,
    #[serde(alias = "l5")]
    pub load5_kg: Option<f64>,
    #[serde(alias = "p1")]
    pub pressure1: Option<f64>,
    #[serde(alias = "vel")]
    pub speed_kmph: Option<f64>,
    #[serde(alias = "ia")]
    pub inclination_angle: Option<f64>,
    #[serde(alias = "sr")]
    pub slip_ratio: Option<f64>,
}

impl TireInputs {
    /// Check the required fields are positive numbers.
    pub fn validate(&self) -> SheetResult<()> {
        let required = [
            ("rim_width", self.rim_width),
            ("rim_diameter", self.rim_diameter),
            ("load1_kg", self.load1_kg),
            ("pressure1", self.pressure1),
        ];
        let fields: Vec<&'static str> = required
            .into_iter()
            .filter(|(_, value)| !value.is_some_and(|v| v.is_finite() && v > 0.0))
            .map(|(name, _)| name)
            .collect();

        if fields.is_empty() {
            Ok(())
        } else {
            Err(SheetError::InvalidInputs { fields })
        }
    }
}
