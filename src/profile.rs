use crate::classify::{ColumnType, ColumnTypeClassifier};
use crate::coerce::{is_blank, numeric_value, to_text};
use crate::data::RowSet;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Per-column statistics, shaped by the column's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum ColumnStats {
    Numerical {
        min: f64,
        max: f64,
        mean: f64,
        count: usize,
    },
    Categorical {
        count: usize,
        unique_count: usize,
        categories: Vec<String>,
    },
    Temporal {
        count: usize,
        unique_count: usize,
    },
}

impl ColumnStats {
    pub fn count(&self) -> usize {
        match self {
            ColumnStats::Numerical { count, .. }
            | ColumnStats::Categorical { count, .. }
            | ColumnStats::Temporal { count, .. } => *count,
        }
    }

    pub fn unique_count(&self) -> Option<usize> {
        match self {
            ColumnStats::Numerical { .. } => None,
            ColumnStats::Categorical { unique_count, .. }
            | ColumnStats::Temporal { unique_count, .. } => Some(*unique_count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub total_rows: usize,
    pub total_columns: usize,
    pub numerical_columns: usize,
    pub categorical_columns: usize,
    pub temporal_columns: usize,
}

/// Inferred column types and statistics for a row-set.
///
/// An empty row-set yields `{columns: [], types: {}, stats: {}}` with no summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub columns: Vec<String>,
    pub types: IndexMap<String, ColumnType>,
    pub stats: IndexMap<String, ColumnStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<ProfileSummary>,
}

impl Profile {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.types.get(column).copied()
    }

    /// Columns of the given type, in discovery order.
    pub fn columns_of(&self, ty: ColumnType) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| self.types.get(c.as_str()) == Some(&ty))
            .map(String::as_str)
            .collect()
    }
}

/// Profile every column named by the first row.
pub fn profile_rows(
    rows: &RowSet,
    classifier: &dyn ColumnTypeClassifier,
    max_categories: usize,
) -> Profile {
    if rows.is_empty() {
        return Profile::default();
    }

    let columns = rows.columns();
    let mut types = IndexMap::with_capacity(columns.len());
    let mut stats = IndexMap::with_capacity(columns.len());

    for column in &columns {
        let values = non_empty_values(rows, column);
        let ty = classifier.classify(&values);
        let column_stats = match ty {
            ColumnType::Numerical => numerical_stats(&values),
            ColumnType::Categorical => categorical_stats(&values, max_categories),
            ColumnType::Temporal => {
                let distinct: IndexSet<String> = values.iter().map(|v| to_text(v)).collect();
                ColumnStats::Temporal {
                    count: values.len(),
                    unique_count: distinct.len(),
                }
            }
        };
        debug!(column = %column, column_type = ?ty, values = values.len(), "profiled column");
        types.insert(column.clone(), ty);
        stats.insert(column.clone(), column_stats);
    }

    let tally = |wanted: ColumnType| types.values().filter(|t| **t == wanted).count();
    let summary = ProfileSummary {
        total_rows: rows.len(),
        total_columns: columns.len(),
        numerical_columns: tally(ColumnType::Numerical),
        categorical_columns: tally(ColumnType::Categorical),
        temporal_columns: tally(ColumnType::Temporal),
    };

    Profile {
        columns,
        types,
        stats,
        summary: Some(summary),
    }
}

/// Non-null, non-empty cells of a column in row order.
pub(crate) fn non_empty_values<'a>(rows: &'a RowSet, column: &'a str) -> Vec<&'a Value> {
    rows.column_cells(column)
        .filter(|cell| !is_blank(*cell))
        .flatten()
        .collect()
}

fn numerical_stats(values: &[&Value]) -> ColumnStats {
    let parsed: Vec<f64> = values
        .iter()
        .filter_map(|v| numeric_value(Some(*v)))
        .filter(|v| v.is_finite())
        .collect();

    if parsed.is_empty() {
        return ColumnStats::Numerical { min: 0.0, max: 0.0, mean: 0.0, count: 0 };
    }

    let min = parsed.iter().copied().fold(f64::INFINITY, f64::min);
    let max = parsed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = parsed.iter().sum::<f64>() / parsed.len() as f64;

    ColumnStats::Numerical { min, max, mean, count: parsed.len() }
}

fn categorical_stats(values: &[&Value], max_categories: usize) -> ColumnStats {
    let distinct: IndexSet<String> = values.iter().map(|v| to_text(v)).collect();
    ColumnStats::Categorical {
        count: values.len(),
        unique_count: distinct.len(),
        categories: distinct.into_iter().take(max_categories).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::SingleSample;
    use serde_json::json;

    fn make_data() -> RowSet {
        RowSet::from_json(&json!([
            {"region": "East", "sales": "10", "day": "2024-01-01"},
            {"region": "West", "sales": "20", "day": "2024-01-02"},
            {"region": "East", "sales": "", "day": "2024-01-02"},
            {"region": "North", "sales": "30", "day": null}
        ]))
        .unwrap()
    }

    #[test]
    fn test_profile_types_and_summary() {
        let profile = profile_rows(&make_data(), &SingleSample::default(), 10);
        assert_eq!(profile.columns, vec!["region", "sales", "day"]);
        assert_eq!(profile.column_type("region"), Some(ColumnType::Categorical));
        assert_eq!(profile.column_type("sales"), Some(ColumnType::Numerical));
        assert_eq!(profile.column_type("day"), Some(ColumnType::Temporal));

        let summary = profile.summary.unwrap();
        assert_eq!(summary.total_rows, 4);
        assert_eq!(summary.total_columns, 3);
        assert_eq!(summary.numerical_columns, 1);
        assert_eq!(summary.categorical_columns, 1);
        assert_eq!(summary.temporal_columns, 1);
    }

    #[test]
    fn test_profile_stats() {
        let profile = profile_rows(&make_data(), &SingleSample::default(), 10);
        assert_eq!(
            profile.stats["sales"],
            ColumnStats::Numerical { min: 10.0, max: 30.0, mean: 20.0, count: 3 }
        );
        assert_eq!(
            profile.stats["region"],
            ColumnStats::Categorical {
                count: 4,
                unique_count: 3,
                categories: vec!["East".into(), "West".into(), "North".into()],
            }
        );
        assert_eq!(
            profile.stats["day"],
            ColumnStats::Temporal { count: 3, unique_count: 2 }
        );
    }

    #[test]
    fn test_numeric_stats_skip_unparseable() {
        let rows = RowSet::from_json(&json!([
            {"v": 1}, {"v": 2}, {"v": 3}, {"v": null}, {"v": "x"}
        ]))
        .unwrap();
        let profile = profile_rows(&rows, &SingleSample::default(), 10);
        match &profile.stats["v"] {
            ColumnStats::Numerical { count, mean, .. } => {
                assert_eq!(*count, 3);
                assert_eq!(*mean, 2.0);
            }
            other => panic!("unexpected stats {:?}", other),
        }
    }

    #[test]
    fn test_empty_profile_serializes_without_summary() {
        let profile = profile_rows(&RowSet::default(), &SingleSample::default(), 10);
        assert!(profile.is_empty());
        assert_eq!(
            serde_json::to_value(&profile).unwrap(),
            json!({"columns": [], "types": {}, "stats": {}})
        );
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let stats = ColumnStats::Temporal { count: 2, unique_count: 1 };
        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            json!({"count": 2, "uniqueCount": 1})
        );
    }
}
