use crate::classify::ColumnType;
use crate::data::RowSet;
use crate::family::{lookup, ChartFamily};
use crate::ir::ChartOptions;
use crate::profile::Profile;
use crate::resolve::{resolve_bindings, ColumnPartition};
use serde::Serialize;

/// A suggested chart family with the bindings it would use.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub family: ChartFamily,
    pub reason: String,
    pub confidence: f64,
    pub options: ChartOptions,
}

/// Rank chart families for a profiled row-set, highest confidence first.
pub fn recommend(profile: &Profile) -> Vec<Recommendation> {
    let numerical = profile.columns_of(ColumnType::Numerical).len();
    let categorical = profile.columns_of(ColumnType::Categorical);
    let temporal = profile.columns_of(ColumnType::Temporal).len();

    let first_unique = categorical
        .first()
        .and_then(|c| profile.stats.get(*c))
        .and_then(|s| s.unique_count());

    let mut picks: Vec<(ChartFamily, &str, f64)> = Vec::new();

    if !categorical.is_empty() && numerical >= 1 {
        if first_unique.is_some_and(|u| u <= 10) {
            picks.push((ChartFamily::Bar, "Compare values across categories", 0.9));
        }
        if first_unique.is_some_and(|u| u <= 6) {
            picks.push((ChartFamily::Pie, "Show each category's share of the total", 0.8));
        }
    }
    if temporal >= 1 && numerical >= 1 {
        picks.push((ChartFamily::Line, "Show a trend over time", 0.95));
    }
    if numerical >= 2 {
        picks.push((ChartFamily::Scatter, "Explore the relationship between two measures", 0.85));
    }
    if numerical >= 1 {
        picks.push((ChartFamily::Histogram, "Show how a measure is distributed", 0.8));
    }
    if categorical.len() >= 2 && numerical >= 1 {
        picks.push((ChartFamily::GroupedBar, "Compare a measure across two groupings", 0.8));
    }
    if numerical >= 3 {
        picks.push((ChartFamily::Bubble, "Relate three measures at once", 0.7));
    }

    let mut recommendations: Vec<Recommendation> = picks
        .into_iter()
        .map(|(family, reason, confidence)| Recommendation {
            family,
            reason: reason.to_string(),
            confidence,
            options: suggest_options(profile, family),
        })
        .collect();

    // Stable, so equal confidence keeps rule order
    recommendations.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    recommendations
}

/// Column bindings the builder would infer for `family` from this profile.
pub fn suggest_options(profile: &Profile, family: ChartFamily) -> ChartOptions {
    let partition = ColumnPartition::from_profile(profile);
    let mut options = ChartOptions::default();
    // Non-strict resolution never fails
    if let Ok(bindings) = resolve_bindings(
        lookup(family),
        &ChartOptions::default(),
        &partition,
        &RowSet::default(),
        false,
    ) {
        for (role, column) in bindings.iter() {
            options.set_column(role, column);
        }
    }
    options
}
