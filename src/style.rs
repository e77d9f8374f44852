//! Style resolution.
//!
//! Family defaults are filled in first, then every explicit option replaces
//! its default. Titles come from the family's template with bound column
//! names substituted; a template naming an unbound role falls back to the
//! family's display name.

use crate::family::{AggregationPolicy, AxisLayout, FamilyEntry, Role};
use crate::ir::{ChartOptions, ChartStyle, ResolvedBindings, SeriesData};
use crate::palette::ColorPalette;
use crate::template::expand_placeholders;
use std::collections::HashMap;
use tracing::debug;

const X_TITLE_ROLES: [Role; 3] = [Role::X, Role::Label, Role::Source];
const Y_TITLE_ROLES: [Role; 3] = [Role::Y, Role::Value, Role::Bar];

pub fn resolve_style(
    entry: &FamilyEntry,
    bindings: &ResolvedBindings,
    options: &ChartOptions,
    data: &SeriesData,
) -> ChartStyle {
    let title = options
        .title
        .clone()
        .unwrap_or_else(|| default_title(entry, bindings));

    let (default_x, default_y) = default_axis_titles(entry, bindings);
    let traits = entry.traits;

    ChartStyle {
        title,
        x_axis_title: options.x_axis_title.clone().or(default_x),
        y_axis_title: options.y_axis_title.clone().or(default_y),
        legend_position: options.legend_position.unwrap_or(entry.legend),
        show_legend: options
            .show_legend
            .unwrap_or_else(|| traits.per_item_colors || legend_entries(data) > 1),
        palette: ColorPalette::resolve(options.palette.as_deref()),
        stacked: traits.stacked,
        fill: traits.fill,
        stepped: traits.stepped,
        index_axis: traits.horizontal.then(|| "y".to_string()),
    }
}

fn default_title(entry: &FamilyEntry, bindings: &ResolvedBindings) -> String {
    let vars: HashMap<&str, String> = bindings
        .iter()
        .map(|(role, column)| (role.template_key(), column.to_string()))
        .collect();
    match expand_placeholders(entry.title, &vars) {
        Ok(title) => title,
        Err(e) => {
            debug!(family = %entry.family, error = %e, "title template fallback");
            entry.family.display_name().to_string()
        }
    }
}

fn default_axis_titles(
    entry: &FamilyEntry,
    bindings: &ResolvedBindings,
) -> (Option<String>, Option<String>) {
    if entry.axes != AxisLayout::Cartesian {
        return (None, None);
    }
    if entry.aggregation == AggregationPolicy::Bin {
        return (
            bindings.get(Role::Value).map(String::from),
            Some("Frequency".to_string()),
        );
    }
    let first_bound = |roles: &[Role]| {
        roles
            .iter()
            .find_map(|r| bindings.get(*r))
            .map(String::from)
    };
    (first_bound(&X_TITLE_ROLES), first_bound(&Y_TITLE_ROLES))
}

fn legend_entries(data: &SeriesData) -> usize {
    match data {
        SeriesData::Categorical { series, .. } => series.len(),
        SeriesData::Points { series } => series.len(),
        SeriesData::Distribution { groups } => groups.len(),
        _ => 0,
    }
}

/// Assign palette colours: one per item for slice-like families, otherwise one per series.
pub fn apply_colors(data: &mut SeriesData, palette: &ColorPalette, per_item: bool) {
    match data {
        SeriesData::Categorical { labels, series } => {
            for (i, s) in series.iter_mut().enumerate() {
                if per_item {
                    s.background_color = (0..labels.len()).map(|j| palette.primary_at(j)).collect();
                    s.border_color = (0..labels.len()).map(|j| palette.border_at(j)).collect();
                } else {
                    s.background_color = vec![palette.primary_at(i)];
                    s.border_color = vec![palette.border_at(i)];
                }
            }
        }
        SeriesData::Points { series } => {
            for (i, s) in series.iter_mut().enumerate() {
                s.background_color = vec![palette.primary_at(i)];
                s.border_color = vec![palette.border_at(i)];
            }
        }
        SeriesData::Segments { items } => {
            for (j, item) in items.iter_mut().enumerate() {
                item.color = palette.primary_at(j);
            }
        }
        _ => {}
    }
}
