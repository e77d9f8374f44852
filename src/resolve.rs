use crate::classify::{ColumnType, ColumnTypeClassifier};
use crate::data::RowSet;
use crate::error::{ChartError, Result};
use crate::family::{FamilyEntry, Pick};
use crate::ir::{ChartOptions, ResolvedBindings};
use crate::profile::{non_empty_values, Profile};
use tracing::debug;

/// Columns split by type, each list in discovery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnPartition {
    pub all: Vec<String>,
    pub numerical: Vec<String>,
    /// Everything that is not numerical (categorical and temporal).
    pub categorical: Vec<String>,
    pub temporal: Vec<String>,
}

impl ColumnPartition {
    pub fn from_types<F>(columns: &[String], type_of: F) -> Self
    where
        F: Fn(&str) -> Option<ColumnType>,
    {
        let mut partition = ColumnPartition {
            all: columns.to_vec(),
            ..Default::default()
        };
        for column in columns {
            match type_of(column) {
                Some(ColumnType::Numerical) => partition.numerical.push(column.clone()),
                Some(ColumnType::Temporal) => {
                    partition.categorical.push(column.clone());
                    partition.temporal.push(column.clone());
                }
                Some(ColumnType::Categorical) | None => partition.categorical.push(column.clone()),
            }
        }
        partition
    }

    /// Classify the row-set's columns with the shared classifier.
    pub fn infer(rows: &RowSet, classifier: &dyn ColumnTypeClassifier) -> Self {
        let columns = rows.columns();
        Self::from_types(&columns, |c| Some(classifier.classify(&non_empty_values(rows, c))))
    }

    /// Reuse a previously computed profile.
    pub fn from_profile(profile: &Profile) -> Self {
        Self::from_types(&profile.columns, |c| profile.column_type(c))
    }

    pub fn pick(&self, pick: Pick) -> Option<&str> {
        let (list, idx) = match pick {
            Pick::Numerical(i) => (&self.numerical, i),
            Pick::Categorical(i) => (&self.categorical, i),
            Pick::Temporal(i) => (&self.temporal, i),
            Pick::Column(i) => (&self.all, i),
        };
        list.get(idx).map(String::as_str)
    }
}

/// Merge explicit options with the family's defaulting rules.
///
/// A role nothing can fill stays unbound; the failure surfaces later when
/// filtering finds no valid rows. With `strict` set, an explicit column that
/// appears in no row fails here instead.
pub fn resolve_bindings(
    entry: &FamilyEntry,
    options: &ChartOptions,
    partition: &ColumnPartition,
    rows: &RowSet,
    strict: bool,
) -> Result<ResolvedBindings> {
    let mut bindings = ResolvedBindings::default();

    for rule in entry.roles {
        if let Some(explicit) = options.column_for(rule.role) {
            if strict && !rows.has_column(explicit) {
                return Err(ChartError::ColumnNotFound {
                    role: rule.role.option_name().to_string(),
                    column: explicit.to_string(),
                });
            }
            bindings.bind(rule.role, explicit);
            continue;
        }

        if !rule.required {
            continue;
        }

        match rule.picks.iter().find_map(|p| partition.pick(*p)) {
            Some(column) => {
                debug!(family = %entry.family, role = rule.role.option_name(), column, "inferred binding");
                bindings.bind(rule.role, column);
            }
            None => {
                debug!(family = %entry.family, role = rule.role.option_name(), "no column for role");
            }
        }
    }

    Ok(bindings)
}
