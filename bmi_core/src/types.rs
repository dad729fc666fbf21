//! Core domain types for the BMI calculator.
//!
//! This module defines the fundamental types used throughout the system:
//! - Measurements and their accepted ranges
//! - Categories, recommended directions and risk levels
//! - Derived results (BMI record, ideal weight range, time estimate)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

// ============================================================================
// Measurement
// ============================================================================

/// Accepted height range in centimetres
pub const HEIGHT_RANGE_CM: RangeInclusive<f64> = 50.0..=250.0;

/// Accepted weight range in kilograms
pub const WEIGHT_RANGE_KG: RangeInclusive<f64> = 30.0..=200.0;

/// A validated height/weight pair
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    pub height_cm: f64,
    pub weight_kg: f64,
}

impl Measurement {
    /// Validate raw form input against the accepted ranges
    pub fn new(height_cm: f64, weight_kg: f64) -> Result<Self> {
        if !HEIGHT_RANGE_CM.contains(&height_cm) {
            return Err(Error::InvalidInput(format!(
                "height must be between {} and {} cm, got {}",
                HEIGHT_RANGE_CM.start(),
                HEIGHT_RANGE_CM.end(),
                height_cm
            )));
        }
        if !WEIGHT_RANGE_KG.contains(&weight_kg) {
            return Err(Error::InvalidInput(format!(
                "weight must be between {} and {} kg, got {}",
                WEIGHT_RANGE_KG.start(),
                WEIGHT_RANGE_KG.end(),
                weight_kg
            )));
        }
        Ok(Self {
            height_cm,
            weight_kg,
        })
    }
}

// ============================================================================
// Category Types
// ============================================================================

/// BMI category key
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    /// All categories in ascending BMI order
    pub const ALL: [BmiCategory; 4] = [
        BmiCategory::Underweight,
        BmiCategory::Normal,
        BmiCategory::Overweight,
        BmiCategory::Obese,
    ];

    /// Stable lowercase key
    pub fn key(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "underweight",
            BmiCategory::Normal => "normal",
            BmiCategory::Overweight => "overweight",
            BmiCategory::Obese => "obese",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Recommended weight direction for a category
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Gain,
    Maintain,
    Reduce,
}

impl Direction {
    /// Headline used on the recommendations summary
    pub fn summary(&self) -> &'static str {
        match self {
            Direction::Gain => "Gradual Weight Gain",
            Direction::Maintain => "Weight Maintenance",
            Direction::Reduce => "Gradual Weight Reduction",
        }
    }
}

/// Health risk level attached to a category
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RiskLevel {
    #[serde(rename = "very low")]
    VeryLow,
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "moderate")]
    Moderate,
    #[serde(rename = "high")]
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::VeryLow => "very low",
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        };
        f.write_str(label)
    }
}

/// Static description of one BMI category
///
/// `min` is inclusive, `max` exclusive. The last category uses
/// `f64::INFINITY` as its upper bound.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryDefinition {
    pub key: BmiCategory,
    pub min: f64,
    pub max: f64,
    pub name: &'static str,
    pub direction: Direction,
    pub focus: &'static str,
    pub description: &'static str,
    pub risk_level: RiskLevel,
}

impl CategoryDefinition {
    /// Whether `bmi` falls in `[min, max)`
    pub fn contains(&self, bmi: f64) -> bool {
        bmi >= self.min && bmi < self.max
    }
}

/// Pacing multiplier for a risk level
#[derive(Clone, Debug, PartialEq)]
pub struct RiskProfile {
    pub level: RiskLevel,
    pub weeks_per_unit: f64,
    pub description: &'static str,
}

// ============================================================================
// Derived Results
// ============================================================================

/// Healthy weight band for a given height, in kg
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct IdealWeightRange {
    pub min: f64,
    pub max: f64,
    pub target: f64,
}

/// Everything derived from one measurement
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BmiResult {
    pub bmi: f64,
    pub category: BmiCategory,
    pub ideal_weight_range: IdealWeightRange,
    pub deviation: f64,
    pub percentile: i32,
    pub progress_percentage: u8,
}

/// Direction of the weight change needed to reach the target BMI
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeDirection {
    Gain,
    Reduce,
}

impl fmt::Display for ChangeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeDirection::Gain => f.write_str("gain"),
            ChangeDirection::Reduce => f.write_str("reduce"),
        }
    }
}

/// Weight change needed to reach a target BMI
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct WeightChange {
    pub change_kg: f64,
    pub direction: ChangeDirection,
    pub target_weight_kg: f64,
}

/// Weekly pacing toward the goal
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct GoalPace {
    pub weeks: u32,
    pub months: u32,
    pub adjusted_rate_kg_per_week: f64,
    pub safe_rate_kg_per_week: f64,
}

/// Time needed to reach the target weight
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct TimeEstimate {
    pub weight_change_kg: f64,
    pub direction: ChangeDirection,
    pub target_weight_kg: f64,
    pub weeks: u32,
    pub months: u32,
    pub adjusted_rate_kg_per_week: f64,
}
