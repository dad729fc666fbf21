//! Static category and risk tables.
//!
//! Both tables are built once on first use and never mutated afterwards.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cached category table, keyed by category
static CATEGORY_TABLE: Lazy<HashMap<BmiCategory, CategoryDefinition>> =
    Lazy::new(build_category_table);

/// Cached risk table, keyed by risk level
static RISK_TABLE: Lazy<HashMap<RiskLevel, RiskProfile>> = Lazy::new(build_risk_table);

/// Look up the static definition for a category
pub fn category_definition(category: BmiCategory) -> &'static CategoryDefinition {
    &CATEGORY_TABLE[&category]
}

/// Look up the pacing profile for a risk level
pub fn risk_profile(level: RiskLevel) -> &'static RiskProfile {
    &RISK_TABLE[&level]
}

/// Pacing multiplier for the risk level attached to `category`
pub fn risk_multiplier(category: BmiCategory) -> f64 {
    risk_profile(category_definition(category).risk_level).weeks_per_unit
}

/// Display name for a category ("Normal Weight", ...)
pub fn category_name(category: BmiCategory) -> &'static str {
    category_definition(category).name
}

fn build_category_table() -> HashMap<BmiCategory, CategoryDefinition> {
    let definitions = [
        CategoryDefinition {
            key: BmiCategory::Underweight,
            min: 0.0,
            max: 18.5,
            name: "Underweight",
            direction: Direction::Gain,
            focus: "Healthy weight gain through nutrition",
            description: "Below healthy weight range. May indicate nutritional deficiencies or underlying health conditions.",
            risk_level: RiskLevel::Low,
        },
        CategoryDefinition {
            key: BmiCategory::Normal,
            min: 18.5,
            max: 25.0,
            name: "Normal Weight",
            direction: Direction::Maintain,
            focus: "Weight maintenance and health optimization",
            description: "Within healthy weight range. Associated with lowest risk of weight-related health problems.",
            risk_level: RiskLevel::VeryLow,
        },
        CategoryDefinition {
            key: BmiCategory::Overweight,
            min: 25.0,
            max: 30.0,
            name: "Overweight",
            direction: Direction::Reduce,
            focus: "Moderate weight reduction for health improvement",
            description: "Above healthy weight range. Increased risk for hypertension, diabetes, and cardiovascular diseases.",
            risk_level: RiskLevel::Moderate,
        },
        CategoryDefinition {
            key: BmiCategory::Obese,
            min: 30.0,
            max: f64::INFINITY,
            name: "Obese",
            direction: Direction::Reduce,
            focus: "Weight reduction for health risk management",
            description: "Significantly above healthy weight range. High risk for serious health conditions including heart disease and stroke.",
            risk_level: RiskLevel::High,
        },
    ];

    definitions.into_iter().map(|def| (def.key, def)).collect()
}

fn build_risk_table() -> HashMap<RiskLevel, RiskProfile> {
    [
        (RiskLevel::VeryLow, 0.5, "Maintenance focus"),
        (RiskLevel::Low, 0.8, "Gradual improvement"),
        (RiskLevel::Moderate, 1.2, "Moderate pace"),
        (RiskLevel::High, 1.5, "Steady progress"),
    ]
    .into_iter()
    .map(|(level, weeks_per_unit, description)| {
        (
            level,
            RiskProfile {
                level,
                weeks_per_unit,
                description,
            },
        )
    })
    .collect()
}

/// Validate the static tables
///
/// Returns a list of validation errors (empty if valid).
pub fn validate_tables() -> Vec<String> {
    let mut errors = Vec::new();

    let mut expected_min = 0.0;
    for category in BmiCategory::ALL {
        let Some(def) = CATEGORY_TABLE.get(&category) else {
            errors.push(format!("Category '{}' has no definition", category));
            continue;
        };

        if def.key != category {
            errors.push(format!(
                "Category key '{}' doesn't match definition key '{}'",
                category, def.key
            ));
        }
        if def.name.is_empty() {
            errors.push(format!("Category '{}' has empty name", category));
        }
        if def.min != expected_min {
            errors.push(format!(
                "Category '{}' starts at {} but previous range ends at {}",
                category, def.min, expected_min
            ));
        }
        if def.max <= def.min {
            errors.push(format!(
                "Category '{}' has empty range [{}, {})",
                category, def.min, def.max
            ));
        }
        if !RISK_TABLE.contains_key(&def.risk_level) {
            errors.push(format!(
                "Category '{}' references unknown risk level '{}'",
                category, def.risk_level
            ));
        }
        expected_min = def.max;
    }

    if expected_min != f64::INFINITY {
        errors.push(format!(
            "Category ranges end at {} instead of covering all BMIs",
            expected_min
        ));
    }

    for (level, profile) in RISK_TABLE.iter() {
        if profile.weeks_per_unit <= 0.0 {
            errors.push(format!(
                "Risk level '{}' has non-positive multiplier {}",
                level, profile.weeks_per_unit
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_valid() {
        let errors = validate_tables();
        assert!(errors.is_empty(), "Table errors: {:?}", errors);
    }

    #[test]
    fn test_exactly_one_category_contains_each_bmi() {
        for tenths in 0..=800 {
            let bmi = tenths as f64 / 10.0;
            let matches = BmiCategory::ALL
                .iter()
                .filter(|c| category_definition(**c).contains(bmi))
                .count();
            assert_eq!(matches, 1, "BMI {} matched {} categories", bmi, matches);
        }
    }

    #[test]
    fn test_risk_multipliers() {
        assert_eq!(risk_multiplier(BmiCategory::Normal), 0.5);
        assert_eq!(risk_multiplier(BmiCategory::Underweight), 0.8);
        assert_eq!(risk_multiplier(BmiCategory::Overweight), 1.2);
        assert_eq!(risk_multiplier(BmiCategory::Obese), 1.5);
    }

    #[test]
    fn test_category_names() {
        assert_eq!(category_name(BmiCategory::Normal), "Normal Weight");
        assert_eq!(category_name(BmiCategory::Obese), "Obese");
        assert_eq!(risk_profile(RiskLevel::High).description, "Steady progress");
    }
}
