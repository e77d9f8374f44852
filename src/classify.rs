use crate::coerce::{is_date_like, looks_numeric};
use crate::config::{ClassifierKind, EngineConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numerical,
    Categorical,
    Temporal,
}

/// Decides a column's type from its non-empty values (in row order).
///
/// The profiler and the chart builder share one instance so the two never
/// disagree about a column.
pub trait ColumnTypeClassifier: Send + Sync {
    fn classify(&self, values: &[&Value]) -> ColumnType;

    fn name(&self) -> &'static str;
}

/// Looks at the first value only.
#[derive(Debug, Clone)]
pub struct SingleSample {
    temporal_formats: Vec<String>,
}

impl SingleSample {
    pub fn new(temporal_formats: Vec<String>) -> Self {
        Self { temporal_formats }
    }
}

impl Default for SingleSample {
    fn default() -> Self {
        Self::new(EngineConfig::default().temporal_formats)
    }
}

impl ColumnTypeClassifier for SingleSample {
    fn classify(&self, values: &[&Value]) -> ColumnType {
        match values.first() {
            Some(sample) => classify_sample(sample, &self.temporal_formats),
            None => ColumnType::Categorical,
        }
    }

    fn name(&self) -> &'static str {
        "singleSample"
    }
}

/// Votes over every value; a type wins when its share reaches the threshold.
#[derive(Debug, Clone)]
pub struct Majority {
    threshold: f64,
    temporal_formats: Vec<String>,
}

impl Majority {
    pub fn new(threshold: f64, temporal_formats: Vec<String>) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            temporal_formats,
        }
    }
}

impl ColumnTypeClassifier for Majority {
    fn classify(&self, values: &[&Value]) -> ColumnType {
        if values.is_empty() {
            return ColumnType::Categorical;
        }
        let total = values.len() as f64;
        let numeric = values.iter().filter(|v| looks_numeric(v)).count() as f64;
        if numeric / total >= self.threshold {
            return ColumnType::Numerical;
        }
        let temporal = values
            .iter()
            .filter(|v| !looks_numeric(v) && is_date_like(v, &self.temporal_formats))
            .count() as f64;
        if temporal / total >= self.threshold {
            return ColumnType::Temporal;
        }
        ColumnType::Categorical
    }

    fn name(&self) -> &'static str {
        "majority"
    }
}

fn classify_sample(sample: &Value, formats: &[String]) -> ColumnType {
    if looks_numeric(sample) {
        ColumnType::Numerical
    } else if is_date_like(sample, formats) {
        ColumnType::Temporal
    } else {
        ColumnType::Categorical
    }
}

/// Build the classifier selected by the config.
pub fn classifier_from_config(config: &EngineConfig) -> Box<dyn ColumnTypeClassifier> {
    match config.classifier {
        ClassifierKind::SingleSample => {
            Box::new(SingleSample::new(config.temporal_formats.clone()))
        }
        ClassifierKind::Majority => Box::new(Majority::new(
            config.majority_threshold,
            config.temporal_formats.clone(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify_with(c: &dyn ColumnTypeClassifier, values: &[Value]) -> ColumnType {
        let refs: Vec<&Value> = values.iter().collect();
        c.classify(&refs)
    }

    #[test]
    fn test_single_sample_uses_first_value() {
        let c = SingleSample::default();
        assert_eq!(
            classify_with(&c, &[json!("12"), json!("abc"), json!("x")]),
            ColumnType::Numerical
        );
        assert_eq!(
            classify_with(&c, &[json!("abc"), json!("1"), json!("2")]),
            ColumnType::Categorical
        );
        assert_eq!(classify_with(&c, &[json!("2024-03-01")]), ColumnType::Temporal);
        assert_eq!(classify_with(&c, &[]), ColumnType::Categorical);
    }

    #[test]
    fn test_majority_votes() {
        let c = Majority::new(0.8, EngineConfig::default().temporal_formats);
        let mostly_numbers = vec![
            json!("n/a"),
            json!("1"),
            json!("2"),
            json!("3"),
            json!("4"),
        ];
        assert_eq!(classify_with(&c, &mostly_numbers), ColumnType::Numerical);

        let split = vec![json!("a"), json!("1"), json!("b"), json!("2")];
        assert_eq!(classify_with(&c, &split), ColumnType::Categorical);

        let dates = vec![json!("2024-01-01"), json!("2024-01-02")];
        assert_eq!(classify_with(&c, &dates), ColumnType::Temporal);
    }

    #[test]
    fn test_classifier_from_config() {
        let mut config = EngineConfig::default();
        assert_eq!(classifier_from_config(&config).name(), "singleSample");
        config.classifier = ClassifierKind::Majority;
        assert_eq!(classifier_from_config(&config).name(), "majority");
    }

    #[test]
    fn test_column_type_serde() {
        assert_eq!(serde_json::to_value(ColumnType::Temporal).unwrap(), json!("temporal"));
    }
}
