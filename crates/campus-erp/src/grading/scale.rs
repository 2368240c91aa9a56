use serde::{Deserialize, Serialize};

/// One weighted assessment component, e.g. `quiz` out of 20 counting for 10%.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub component: String,
    pub score: f64,
    pub max_score: f64,
    pub weight: f64,
}

impl ComponentScore {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.component.trim().is_empty() {
            return Err("component name must not be blank".to_string());
        }
        if !(self.max_score.is_finite() && self.max_score > 0.0) {
            return Err(format!("max score {} must be positive", self.max_score));
        }
        if !(self.score.is_finite() && (0.0..=self.max_score).contains(&self.score)) {
            return Err(format!(
                "score {} must lie between 0 and {}",
                self.score, self.max_score
            ));
        }
        if !(self.weight.is_finite() && self.weight >= 0.0) {
            return Err(format!("weight {} must not be negative", self.weight));
        }
        Ok(())
    }
}

/// Lower bounds (inclusive) of each letter, highest first.
const LETTER_BANDS: [(f64, &str); 7] = [
    (90.0, "A"),
    (85.0, "A-"),
    (80.0, "B"),
    (75.0, "B-"),
    (70.0, "C"),
    (65.0, "C-"),
    (60.0, "D"),
];

/// Weighted percentage across components, or `None` when no weight is assigned.
pub fn weighted_percentage(components: &[ComponentScore]) -> Option<f64> {
    let total_weight: f64 = components.iter().map(|c| c.weight).sum();
    if total_weight <= 0.0 {
        return None;
    }
    let earned: f64 = components
        .iter()
        .map(|c| c.score / c.max_score * c.weight)
        .sum();
    Some(earned / total_weight * 100.0)
}

pub fn letter_for(percentage: f64) -> &'static str {
    LETTER_BANDS
        .iter()
        .find(|(floor, _)| percentage >= *floor)
        .map(|(_, letter)| *letter)
        .unwrap_or("F")
}
