//! BMI computation and derived statistics.
//!
//! Every function here is pure: same inputs, same outputs, no I/O beyond
//! debug tracing. Values shown to users are rounded to one decimal place
//! with round-half-away-from-zero on the ×10 value.

use crate::catalog::{category_definition, risk_multiplier};
use crate::types::*;
use crate::{Error, Result};

/// Midpoint of the healthy range used for deviation
pub const HEALTHY_MIDPOINT: f64 = 21.7;

/// Default target BMI (middle of the normal range)
pub const TARGET_BMI: f64 = 22.5;

/// Baseline safe rate of weight change
pub const SAFE_RATE_KG_PER_WEEK: f64 = 0.5;

/// Average weeks per calendar month
pub const WEEKS_PER_MONTH: f64 = 4.345;

/// Largest BMI distance counted toward progress above the normal range
const ABOVE_RANGE_PROGRESS_CAP: f64 = 10.0;

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn height_m_squared(height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    height_m * height_m
}

/// Compute BMI from height (cm) and weight (kg), rounded to one decimal
///
/// Fails with [`Error::Computation`] when height is not positive or either
/// value is not finite, instead of producing NaN or infinity.
pub fn compute_bmi(height_cm: f64, weight_kg: f64) -> Result<f64> {
    if !height_cm.is_finite() || height_cm <= 0.0 {
        return Err(Error::Computation(format!(
            "height must be a positive number, got {}",
            height_cm
        )));
    }
    if !weight_kg.is_finite() {
        return Err(Error::Computation(format!(
            "weight must be a finite number, got {}",
            weight_kg
        )));
    }

    let bmi = round1(weight_kg / height_m_squared(height_cm));
    tracing::debug!(bmi, height_cm, weight_kg, "BMI calculated");
    Ok(bmi)
}

/// Classify a BMI into its category
///
/// Intervals are lower-inclusive, so 18.5, 25.0 and 30.0 belong to the
/// higher category.
pub fn classify(bmi: f64) -> BmiCategory {
    let category = if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    };
    tracing::debug!(bmi, %category, "BMI classified");
    category
}

/// Healthy weight band for a height: BMI 18.5 to 24.9, target 22.5
pub fn ideal_weight_range(height_cm: f64) -> IdealWeightRange {
    let h2 = height_m_squared(height_cm);
    let range = IdealWeightRange {
        min: round1(18.5 * h2),
        max: round1(24.9 * h2),
        target: round1(22.5 * h2),
    };
    tracing::debug!(
        min = range.min,
        max = range.max,
        target = range.target,
        "Ideal weight range"
    );
    range
}

/// Rough population percentile for a BMI within its category
///
/// The result is not clamped to [0, 100]; a BMI paired with a category it
/// does not belong to can land outside that range.
pub fn percentile(bmi: f64, category: BmiCategory) -> i32 {
    let raw = match category {
        BmiCategory::Underweight => ((bmi / 18.5) * 15.0).clamp(5.0, 15.0),
        BmiCategory::Normal => 50.0 + ((bmi - 21.0) / 3.9) * 25.0,
        BmiCategory::Overweight => 75.0 + ((bmi - 25.0) / 5.0) * 15.0,
        BmiCategory::Obese => 90.0 + ((bmi - 30.0) / 20.0 * 10.0).min(10.0),
    };
    let percentile = raw.round() as i32;
    tracing::debug!(bmi, %category, percentile, "Percentile rank");
    percentile
}

/// Signed distance from the healthy midpoint (21.7), rounded to one decimal
pub fn deviation(bmi: f64) -> f64 {
    round1(bmi - HEALTHY_MIDPOINT)
}

/// Weight change needed to reach `target_bmi` at the given height
pub fn weight_change_needed(current_weight_kg: f64, height_cm: f64, target_bmi: f64) -> WeightChange {
    let target_weight = target_bmi * height_m_squared(height_cm);
    let delta = target_weight - current_weight_kg;

    let change = WeightChange {
        change_kg: round1(delta.abs()),
        direction: if delta > 0.0 {
            ChangeDirection::Gain
        } else {
            ChangeDirection::Reduce
        },
        target_weight_kg: round1(target_weight),
    };
    tracing::debug!(
        change_kg = change.change_kg,
        direction = %change.direction,
        "Weight change needed"
    );
    change
}

/// Estimate weeks and months to close `change_kg` at a risk-adjusted pace
///
/// The safe rate is divided by the category's risk multiplier, so
/// categories with a larger multiplier progress more slowly per week.
pub fn estimate_time_to_goal(change_kg: f64, category: BmiCategory) -> GoalPace {
    let adjusted_rate = SAFE_RATE_KG_PER_WEEK / risk_multiplier(category);
    let weeks = (change_kg / adjusted_rate).ceil().max(0.0) as u32;
    let months = (weeks as f64 / WEEKS_PER_MONTH).ceil() as u32;

    tracing::debug!(weeks, months, adjusted_rate, "Time estimation");
    GoalPace {
        weeks,
        months,
        adjusted_rate_kg_per_week: adjusted_rate,
        safe_rate_kg_per_week: SAFE_RATE_KG_PER_WEEK,
    }
}

/// Progress toward (or within) the normal range, as a percentage in [0, 100]
///
/// - normal: closeness to the 22.5 midpoint relative to the farthest edge
/// - underweight: distance closed toward 18.5 over the full category width
/// - overweight/obese: distance closed toward 25.0, capped at 10 BMI points
pub fn progress_percentage(bmi: f64, category: BmiCategory) -> u8 {
    let def = category_definition(category);
    let normal = category_definition(BmiCategory::Normal);

    let (distance, max_distance) = match category {
        BmiCategory::Normal => {
            let max_distance = (TARGET_BMI - normal.min).max(normal.max - TARGET_BMI);
            ((bmi - TARGET_BMI).abs(), max_distance)
        }
        BmiCategory::Underweight => ((bmi - normal.min).abs(), def.max - def.min),
        BmiCategory::Overweight | BmiCategory::Obese => {
            ((bmi - normal.max).abs(), ABOVE_RANGE_PROGRESS_CAP)
        }
    };

    let progress = if max_distance > 0.0 {
        ((max_distance - distance) / max_distance * 100.0).round()
    } else {
        0.0
    };
    let clamped = progress.clamp(0.0, 100.0) as u8;
    tracing::debug!(bmi, %category, progress = clamped, "Progress percentage");
    clamped
}

/// Sentence comparing a deviation to the healthy midpoint
pub fn comparison_text(deviation: f64) -> String {
    let direction = if deviation > 0.0 { "above" } else { "below" };
    format!(
        "Your BMI is {} points {} the healthy range midpoint ({}).",
        deviation.abs(),
        direction,
        HEALTHY_MIDPOINT
    )
}

impl BmiResult {
    /// Derive the full result record for a measurement
    pub fn assess(measurement: &Measurement) -> Result<Self> {
        let bmi = compute_bmi(measurement.height_cm, measurement.weight_kg)?;
        let category = classify(bmi);

        Ok(Self {
            bmi,
            category,
            ideal_weight_range: ideal_weight_range(measurement.height_cm),
            deviation: deviation(bmi),
            percentile: percentile(bmi, category),
            progress_percentage: progress_percentage(bmi, category),
        })
    }
}

impl TimeEstimate {
    /// Combine a weight change with its pacing
    pub fn new(change: &WeightChange, pace: &GoalPace) -> Self {
        Self {
            weight_change_kg: change.change_kg,
            direction: change.direction,
            target_weight_kg: change.target_weight_kg,
            weeks: pace.weeks,
            months: pace.months,
            adjusted_rate_kg_per_week: pace.adjusted_rate_kg_per_week,
        }
    }

    /// Estimate time to reach `target_bmi` from a measurement
    pub fn for_measurement(
        measurement: &Measurement,
        category: BmiCategory,
        target_bmi: f64,
    ) -> Self {
        let change = weight_change_needed(measurement.weight_kg, measurement.height_cm, target_bmi);
        let pace = estimate_time_to_goal(change.change_kg, category);
        Self::new(&change, &pace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_bmi_reference_values() {
        assert_eq!(compute_bmi(170.0, 65.0).unwrap(), 22.5);
        assert_eq!(compute_bmi(150.0, 45.0).unwrap(), 20.0);
        assert_eq!(classify(compute_bmi(170.0, 65.0).unwrap()), BmiCategory::Normal);
    }

    #[test]
    fn test_compute_bmi_rejects_degenerate_height() {
        assert!(matches!(compute_bmi(0.0, 65.0), Err(Error::Computation(_))));
        assert!(matches!(compute_bmi(-10.0, 65.0), Err(Error::Computation(_))));
        assert!(compute_bmi(f64::NAN, 65.0).is_err());
        assert!(compute_bmi(170.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_boundaries_belong_to_higher_category() {
        assert_eq!(classify(18.4), BmiCategory::Underweight);
        assert_eq!(classify(18.5), BmiCategory::Normal);
        assert_eq!(classify(24.9), BmiCategory::Normal);
        assert_eq!(classify(25.0), BmiCategory::Overweight);
        assert_eq!(classify(29.9), BmiCategory::Overweight);
        assert_eq!(classify(30.0), BmiCategory::Obese);
    }

    #[test]
    fn test_classify_is_stable() {
        for bmi in [12.0, 18.5, 22.0, 27.3, 41.0] {
            assert_eq!(classify(bmi), classify(bmi));
        }
    }

    #[test]
    fn test_every_valid_measurement_classifies_consistently() {
        for height in (50..=250).step_by(5) {
            for weight in (30..=200).step_by(5) {
                let bmi = compute_bmi(height as f64, weight as f64).unwrap();
                let category = classify(bmi);
                assert!(category_definition(category).contains(bmi));
            }
        }
    }

    #[test]
    fn test_ideal_weight_range() {
        let range = ideal_weight_range(150.0);
        assert_eq!(range.min, 41.6);
        assert_eq!(range.max, 56.0);
        assert_eq!(range.target, 50.6);
    }

    #[test]
    fn test_deviation_sign() {
        assert_eq!(deviation(22.5), 0.8);
        assert_eq!(deviation(20.0), -1.7);
        for bmi in [15.0, 21.6, 21.8, 35.0] {
            assert_eq!(deviation(bmi) > 0.0, bmi > HEALTHY_MIDPOINT);
        }
    }

    #[test]
    fn test_percentile_formulas() {
        assert_eq!(percentile(22.5, BmiCategory::Normal), 60);
        assert_eq!(percentile(27.5, BmiCategory::Overweight), 83);
        assert_eq!(percentile(40.0, BmiCategory::Obese), 95);
        assert_eq!(percentile(80.0, BmiCategory::Obese), 100);
        assert_eq!(percentile(10.0, BmiCategory::Underweight), 8);
        assert_eq!(percentile(1.0, BmiCategory::Underweight), 5);
    }

    #[test]
    fn test_percentile_is_not_clamped_for_mismatched_category() {
        assert!(percentile(5.0, BmiCategory::Normal) < 0);
    }

    #[test]
    fn test_weight_change_needed() {
        let change = weight_change_needed(80.0, 170.0, TARGET_BMI);
        assert_eq!(change.target_weight_kg, 65.0);
        assert_eq!(change.change_kg, 15.0);
        assert_eq!(change.direction, ChangeDirection::Reduce);

        let gain = weight_change_needed(50.0, 170.0, TARGET_BMI);
        assert_eq!(gain.direction, ChangeDirection::Gain);
    }

    #[test]
    fn test_estimate_time_to_goal() {
        // Overweight: 0.5 / 1.2 kg per week
        let pace = estimate_time_to_goal(14.0, BmiCategory::Overweight);
        assert_eq!(pace.weeks, 34);
        assert_eq!(pace.months, 8);

        // Normal: 0.5 / 0.5 = 1 kg per week
        let pace = estimate_time_to_goal(2.0, BmiCategory::Normal);
        assert_eq!(pace.weeks, 2);
        assert_eq!(pace.months, 1);
        assert_eq!(pace.adjusted_rate_kg_per_week, 1.0);

        let pace = estimate_time_to_goal(0.0, BmiCategory::Normal);
        assert_eq!(pace.weeks, 0);
        assert_eq!(pace.months, 0);
    }

    #[test]
    fn test_larger_multiplier_means_more_weeks() {
        let moderate = estimate_time_to_goal(10.0, BmiCategory::Overweight);
        let high = estimate_time_to_goal(10.0, BmiCategory::Obese);
        assert!(high.weeks > moderate.weeks);
    }

    #[test]
    fn test_progress_percentage_values() {
        assert_eq!(progress_percentage(22.5, BmiCategory::Normal), 100);
        assert_eq!(progress_percentage(18.5, BmiCategory::Normal), 0);
        assert_eq!(progress_percentage(24.5, BmiCategory::Normal), 50);
        assert_eq!(progress_percentage(16.65, BmiCategory::Underweight), 90);
        assert_eq!(progress_percentage(27.0, BmiCategory::Overweight), 80);
        assert_eq!(progress_percentage(40.0, BmiCategory::Obese), 0);
    }

    #[test]
    fn test_progress_percentage_always_in_range() {
        for tenths in 100..=500 {
            let bmi = tenths as f64 / 10.0;
            for category in BmiCategory::ALL {
                let progress = progress_percentage(bmi, category);
                assert!(progress <= 100, "{} for {} / {}", progress, bmi, category);
            }
        }
    }

    #[test]
    fn test_assess_builds_full_record() {
        let measurement = Measurement::new(170.0, 65.0).unwrap();
        let result = BmiResult::assess(&measurement).unwrap();
        assert_eq!(result.bmi, 22.5);
        assert_eq!(result.category, BmiCategory::Normal);
        assert_eq!(result.deviation, 0.8);
        assert_eq!(result.progress_percentage, 100);
    }

    #[test]
    fn test_time_estimate_for_measurement() {
        let measurement = Measurement::new(170.0, 80.0).unwrap();
        let estimate = TimeEstimate::for_measurement(&measurement, BmiCategory::Overweight, TARGET_BMI);
        assert_eq!(estimate.weight_change_kg, 15.0);
        assert_eq!(estimate.direction, ChangeDirection::Reduce);
        assert_eq!(
            estimate.weeks,
            estimate_time_to_goal(15.0, BmiCategory::Overweight).weeks
        );
    }

    #[test]
    fn test_comparison_text() {
        assert_eq!(
            comparison_text(0.8),
            "Your BMI is 0.8 points above the healthy range midpoint (21.7)."
        );
        assert!(comparison_text(-1.7).contains("1.7 points below"));
    }
}
