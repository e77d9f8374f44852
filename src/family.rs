//! Chart family dispatch table.
//!
//! Every family is one [`FamilyEntry`]: which roles it binds and how to default
//! them, how categories are ordered, how rows are aggregated and which style
//! traits it carries. The builder never branches on a family name; it reads
//! the entry.

use crate::error::ChartError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartFamily {
    Bar,
    Line,
    Scatter,
    Pie,
    Doughnut,
    Area,
    Radar,
    PolarArea,
    Bubble,
    StackedBar,
    GroupedBar,
    HorizontalBar,
    StackedArea,
    StepLine,
    MixedChart,
    Waterfall,
    Funnel,
    Histogram,
    Boxplot,
    Violin,
    Heatmap,
    Gauge,
    Bullet,
    KpiCard,
    Sankey,
    Treemap,
}

impl ChartFamily {
    pub const ALL: [ChartFamily; 26] = [
        ChartFamily::Bar,
        ChartFamily::Line,
        ChartFamily::Scatter,
        ChartFamily::Pie,
        ChartFamily::Doughnut,
        ChartFamily::Area,
        ChartFamily::Radar,
        ChartFamily::PolarArea,
        ChartFamily::Bubble,
        ChartFamily::StackedBar,
        ChartFamily::GroupedBar,
        ChartFamily::HorizontalBar,
        ChartFamily::StackedArea,
        ChartFamily::StepLine,
        ChartFamily::MixedChart,
        ChartFamily::Waterfall,
        ChartFamily::Funnel,
        ChartFamily::Histogram,
        ChartFamily::Boxplot,
        ChartFamily::Violin,
        ChartFamily::Heatmap,
        ChartFamily::Gauge,
        ChartFamily::Bullet,
        ChartFamily::KpiCard,
        ChartFamily::Sankey,
        ChartFamily::Treemap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartFamily::Bar => "bar",
            ChartFamily::Line => "line",
            ChartFamily::Scatter => "scatter",
            ChartFamily::Pie => "pie",
            ChartFamily::Doughnut => "doughnut",
            ChartFamily::Area => "area",
            ChartFamily::Radar => "radar",
            ChartFamily::PolarArea => "polarArea",
            ChartFamily::Bubble => "bubble",
            ChartFamily::StackedBar => "stackedBar",
            ChartFamily::GroupedBar => "groupedBar",
            ChartFamily::HorizontalBar => "horizontalBar",
            ChartFamily::StackedArea => "stackedArea",
            ChartFamily::StepLine => "stepLine",
            ChartFamily::MixedChart => "mixedChart",
            ChartFamily::Waterfall => "waterfall",
            ChartFamily::Funnel => "funnel",
            ChartFamily::Histogram => "histogram",
            ChartFamily::Boxplot => "boxplot",
            ChartFamily::Violin => "violin",
            ChartFamily::Heatmap => "heatmap",
            ChartFamily::Gauge => "gauge",
            ChartFamily::Bullet => "bullet",
            ChartFamily::KpiCard => "kpiCard",
            ChartFamily::Sankey => "sankey",
            ChartFamily::Treemap => "treemap",
        }
    }

    /// Human-readable name, used as the fallback title.
    pub fn display_name(&self) -> &'static str {
        match self {
            ChartFamily::Bar => "Bar Chart",
            ChartFamily::Line => "Line Chart",
            ChartFamily::Scatter => "Scatter Plot",
            ChartFamily::Pie => "Pie Chart",
            ChartFamily::Doughnut => "Doughnut Chart",
            ChartFamily::Area => "Area Chart",
            ChartFamily::Radar => "Radar Chart",
            ChartFamily::PolarArea => "Polar Area Chart",
            ChartFamily::Bubble => "Bubble Chart",
            ChartFamily::StackedBar => "Stacked Bar Chart",
            ChartFamily::GroupedBar => "Grouped Bar Chart",
            ChartFamily::HorizontalBar => "Horizontal Bar Chart",
            ChartFamily::StackedArea => "Stacked Area Chart",
            ChartFamily::StepLine => "Step Line Chart",
            ChartFamily::MixedChart => "Mixed Chart",
            ChartFamily::Waterfall => "Waterfall Chart",
            ChartFamily::Funnel => "Funnel Chart",
            ChartFamily::Histogram => "Histogram",
            ChartFamily::Boxplot => "Box Plot",
            ChartFamily::Violin => "Violin Plot",
            ChartFamily::Heatmap => "Correlation Heatmap",
            ChartFamily::Gauge => "Gauge",
            ChartFamily::Bullet => "Bullet Chart",
            ChartFamily::KpiCard => "KPI Card",
            ChartFamily::Sankey => "Sankey Diagram",
            ChartFamily::Treemap => "Treemap",
        }
    }
}

impl fmt::Display for ChartFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartFamily {
    type Err = ChartError;

    /// Case-insensitive, so `stackedbar` and `polararea` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ChartFamily::ALL
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ChartError::UnsupportedChartType {
                family: s.to_string(),
            })
    }
}

/// Abstract column role. Serialises as the option field that binds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "xColumn")]
    X,
    #[serde(rename = "yColumn")]
    Y,
    #[serde(rename = "labelColumn")]
    Label,
    #[serde(rename = "valueColumn")]
    Value,
    #[serde(rename = "groupByColumn")]
    GroupBy,
    #[serde(rename = "barColumn")]
    Bar,
    #[serde(rename = "lineColumn")]
    Line,
    #[serde(rename = "sizeColumn")]
    Size,
    #[serde(rename = "targetColumn")]
    Target,
    #[serde(rename = "sourceColumn")]
    Source,
}

impl Role {
    pub fn option_name(&self) -> &'static str {
        match self {
            Role::X => "xColumn",
            Role::Y => "yColumn",
            Role::Label => "labelColumn",
            Role::Value => "valueColumn",
            Role::GroupBy => "groupByColumn",
            Role::Bar => "barColumn",
            Role::Line => "lineColumn",
            Role::Size => "sizeColumn",
            Role::Target => "targetColumn",
            Role::Source => "sourceColumn",
        }
    }

    /// Placeholder name inside title templates.
    pub fn template_key(&self) -> &'static str {
        match self {
            Role::X => "x",
            Role::Y => "y",
            Role::Label => "label",
            Role::Value => "value",
            Role::GroupBy => "groupBy",
            Role::Bar => "bar",
            Role::Line => "line",
            Role::Size => "size",
            Role::Target => "target",
            Role::Source => "source",
        }
    }
}

/// One candidate for an auto-inferred role, indexing the column partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    /// i-th numerical column.
    Numerical(usize),
    /// i-th non-numerical column (categorical and temporal together).
    Categorical(usize),
    /// i-th temporal column.
    Temporal(usize),
    /// i-th column of any type.
    Column(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct RoleRule {
    pub role: Role,
    /// Tried in order; the first pick that exists wins.
    pub picks: &'static [Pick],
    /// Cells must be valid numbers for a row to survive filtering.
    pub measure: bool,
    /// Optional roles stay unbound when no explicit column is given.
    pub required: bool,
}

const fn required(role: Role, picks: &'static [Pick]) -> RoleRule {
    RoleRule { role, picks, measure: false, required: true }
}

const fn measure(role: Role, picks: &'static [Pick]) -> RoleRule {
    RoleRule { role, picks, measure: true, required: true }
}

const fn optional(role: Role) -> RoleRule {
    RoleRule { role, picks: &[], measure: false, required: false }
}

/// How category keys are ordered in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingPolicy {
    /// Row order, duplicates kept.
    RowOrder,
    /// Distinct keys in first-seen order.
    FirstSeen,
    /// Distinct keys sorted lexicographically.
    Lexicographic,
    /// Sorted by value, largest first (stable).
    DescendingValue,
}

/// How cleaned rows turn into series data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationPolicy {
    /// One point per row: label from `label`, value from `value`.
    RowSeries { label: Role, value: Role },
    /// One `{x, y[, r]}` point per row.
    RowPoints { size: Option<Role> },
    /// Sum `measure` per distinct `key`.
    Sum { key: Role, measure: Role },
    /// Dense category × series grid of sums.
    Pivot,
    /// First N rows as paired bar/line values.
    PairedRows,
    /// Running total over the first N rows.
    Cumulative,
    /// One segment per row.
    RowSegments,
    /// Segments summed per distinct label.
    SumSegments,
    /// Equal-width bins of `value`.
    Bin,
    /// Quartiles and whiskers per group.
    Quartiles,
    /// Kernel density per group.
    Density,
    /// Pearson correlation over every numerical column.
    Correlation,
    /// Single mean value against a range.
    Gauge,
    /// Total, mean, latest and trend.
    Kpi,
    /// Value against target per row, first N rows.
    Bullets,
    /// Summed source → target links.
    Links,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    #[default]
    Top,
    Bottom,
    Left,
    Right,
}

/// Which axes the family draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisLayout {
    Cartesian,
    Radial,
    None,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FamilyTraits {
    pub stacked: bool,
    pub fill: bool,
    pub stepped: bool,
    pub horizontal: bool,
    /// Value axis always includes zero.
    pub zero_baseline: bool,
    /// One colour per item instead of one per series.
    pub per_item_colors: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct FamilyEntry {
    pub family: ChartFamily,
    pub roles: &'static [RoleRule],
    pub ordering: OrderingPolicy,
    pub aggregation: AggregationPolicy,
    pub legend: LegendPosition,
    pub axes: AxisLayout,
    pub traits: FamilyTraits,
    /// `{role}` placeholders, see [`Role::template_key`].
    pub title: &'static str,
}

const NUM0: &[Pick] = &[Pick::Numerical(0)];
const NUM1_OR_0: &[Pick] = &[Pick::Numerical(1), Pick::Numerical(0)];
const NUM2_OR_0: &[Pick] = &[Pick::Numerical(2), Pick::Numerical(0)];
const CAT0: &[Pick] = &[Pick::Categorical(0)];
const CAT1_OR_0: &[Pick] = &[Pick::Categorical(1), Pick::Categorical(0)];
const TIME_AXIS: &[Pick] = &[Pick::Temporal(0), Pick::Categorical(0), Pick::Column(0)];

const XY_CATEGORY: &[RoleRule] = &[required(Role::X, CAT0), measure(Role::Y, NUM0)];
const XY_SEQUENCE: &[RoleRule] = &[required(Role::X, TIME_AXIS), measure(Role::Y, NUM0)];
const XY_NUMERIC: &[RoleRule] = &[measure(Role::X, NUM0), measure(Role::Y, NUM1_OR_0)];
const XY_SIZE: &[RoleRule] = &[
    measure(Role::X, NUM0),
    measure(Role::Y, NUM1_OR_0),
    measure(Role::Size, NUM2_OR_0),
];
const LABEL_VALUE: &[RoleRule] = &[required(Role::Label, CAT0), measure(Role::Value, NUM0)];
const GROUPED: &[RoleRule] = &[
    required(Role::X, CAT0),
    required(Role::GroupBy, CAT1_OR_0),
    measure(Role::Value, NUM0),
];
const MIXED: &[RoleRule] = &[
    required(Role::X, CAT0),
    measure(Role::Bar, NUM0),
    measure(Role::Line, NUM1_OR_0),
];
const HORIZONTAL: &[RoleRule] = &[measure(Role::X, NUM0), required(Role::Y, CAT0)];
const VALUE_ONLY: &[RoleRule] = &[measure(Role::Value, NUM0)];
const DISTRIBUTION: &[RoleRule] = &[measure(Role::Value, NUM0), optional(Role::GroupBy)];
const BULLET: &[RoleRule] = &[
    required(Role::Label, CAT0),
    measure(Role::Value, NUM0),
    measure(Role::Target, NUM1_OR_0),
];
const FLOW: &[RoleRule] = &[
    required(Role::Source, CAT0),
    required(Role::Target, CAT1_OR_0),
    measure(Role::Value, NUM0),
];

const PLAIN: FamilyTraits = FamilyTraits {
    stacked: false,
    fill: false,
    stepped: false,
    horizontal: false,
    zero_baseline: false,
    per_item_colors: false,
};
const BARS: FamilyTraits = FamilyTraits { zero_baseline: true, ..PLAIN };
const SLICES: FamilyTraits = FamilyTraits { per_item_colors: true, ..PLAIN };

#[allow(clippy::too_many_arguments)]
const fn entry(
    family: ChartFamily,
    roles: &'static [RoleRule],
    ordering: OrderingPolicy,
    aggregation: AggregationPolicy,
    legend: LegendPosition,
    axes: AxisLayout,
    traits: FamilyTraits,
    title: &'static str,
) -> FamilyEntry {
    FamilyEntry { family, roles, ordering, aggregation, legend, axes, traits, title }
}

use self::AggregationPolicy as Agg;
use self::LegendPosition::{Bottom, Top};
use self::OrderingPolicy::{DescendingValue, FirstSeen, Lexicographic, RowOrder};

const ROW_SERIES: AggregationPolicy = Agg::RowSeries { label: Role::X, value: Role::Y };

static TABLE: [FamilyEntry; 26] = [
    entry(ChartFamily::Bar, XY_CATEGORY, FirstSeen, Agg::Sum { key: Role::X, measure: Role::Y }, Top, AxisLayout::Cartesian, BARS, "{y} by {x}"),
    entry(ChartFamily::Line, XY_SEQUENCE, RowOrder, ROW_SERIES, Top, AxisLayout::Cartesian, PLAIN, "{y} over {x}"),
    entry(ChartFamily::Scatter, XY_NUMERIC, RowOrder, Agg::RowPoints { size: None }, Top, AxisLayout::Cartesian, PLAIN, "{y} vs {x}"),
    entry(ChartFamily::Pie, LABEL_VALUE, FirstSeen, Agg::Sum { key: Role::Label, measure: Role::Value }, Bottom, AxisLayout::None, SLICES, "{value} by {label}"),
    entry(ChartFamily::Doughnut, LABEL_VALUE, FirstSeen, Agg::Sum { key: Role::Label, measure: Role::Value }, Bottom, AxisLayout::None, SLICES, "{value} by {label}"),
    entry(ChartFamily::Area, XY_SEQUENCE, RowOrder, ROW_SERIES, Top, AxisLayout::Cartesian, FamilyTraits { fill: true, zero_baseline: true, ..PLAIN }, "{y} over {x}"),
    entry(ChartFamily::Radar, LABEL_VALUE, FirstSeen, Agg::Sum { key: Role::Label, measure: Role::Value }, Top, AxisLayout::Radial, FamilyTraits { fill: true, ..PLAIN }, "{value} by {label}"),
    entry(ChartFamily::PolarArea, LABEL_VALUE, FirstSeen, Agg::Sum { key: Role::Label, measure: Role::Value }, Bottom, AxisLayout::Radial, SLICES, "{value} by {label}"),
    entry(ChartFamily::Bubble, XY_SIZE, RowOrder, Agg::RowPoints { size: Some(Role::Size) }, Top, AxisLayout::Cartesian, PLAIN, "{y} vs {x} (size: {size})"),
    entry(ChartFamily::StackedBar, GROUPED, Lexicographic, Agg::Pivot, Top, AxisLayout::Cartesian, FamilyTraits { stacked: true, ..BARS }, "{value} by {x} and {groupBy}"),
    entry(ChartFamily::GroupedBar, GROUPED, Lexicographic, Agg::Pivot, Top, AxisLayout::Cartesian, BARS, "{value} by {x} and {groupBy}"),
    entry(ChartFamily::HorizontalBar, HORIZONTAL, FirstSeen, Agg::Sum { key: Role::Y, measure: Role::X }, Top, AxisLayout::Cartesian, FamilyTraits { horizontal: true, ..BARS }, "{x} by {y}"),
    entry(ChartFamily::StackedArea, GROUPED, Lexicographic, Agg::Pivot, Top, AxisLayout::Cartesian, FamilyTraits { stacked: true, fill: true, zero_baseline: true, ..PLAIN }, "{value} by {x} and {groupBy}"),
    entry(ChartFamily::StepLine, XY_SEQUENCE, RowOrder, ROW_SERIES, Top, AxisLayout::Cartesian, FamilyTraits { stepped: true, ..PLAIN }, "{y} over {x}"),
    entry(ChartFamily::MixedChart, MIXED, RowOrder, Agg::PairedRows, Top, AxisLayout::Cartesian, BARS, "{bar} and {line} by {x}"),
    entry(ChartFamily::Waterfall, LABEL_VALUE, RowOrder, Agg::Cumulative, Top, AxisLayout::Cartesian, BARS, "Cumulative {value} by {label}"),
    entry(ChartFamily::Funnel, LABEL_VALUE, DescendingValue, Agg::RowSegments, Top, AxisLayout::None, SLICES, "{value} by {label}"),
    entry(ChartFamily::Histogram, VALUE_ONLY, RowOrder, Agg::Bin, Top, AxisLayout::Cartesian, BARS, "Distribution of {value}"),
    entry(ChartFamily::Boxplot, DISTRIBUTION, Lexicographic, Agg::Quartiles, Top, AxisLayout::Cartesian, PLAIN, "Distribution of {value}"),
    entry(ChartFamily::Violin, DISTRIBUTION, Lexicographic, Agg::Density, Top, AxisLayout::Cartesian, PLAIN, "Distribution of {value}"),
    entry(ChartFamily::Heatmap, &[], RowOrder, Agg::Correlation, Top, AxisLayout::Cartesian, PLAIN, "Correlation Matrix"),
    entry(ChartFamily::Gauge, VALUE_ONLY, RowOrder, Agg::Gauge, Top, AxisLayout::None, PLAIN, "{value}"),
    entry(ChartFamily::Bullet, BULLET, RowOrder, Agg::Bullets, Top, AxisLayout::Cartesian, FamilyTraits { horizontal: true, ..BARS }, "{value} vs {target}"),
    entry(ChartFamily::KpiCard, VALUE_ONLY, RowOrder, Agg::Kpi, Top, AxisLayout::None, PLAIN, "{value}"),
    entry(ChartFamily::Sankey, FLOW, FirstSeen, Agg::Links, Top, AxisLayout::None, PLAIN, "{source} to {target}"),
    entry(ChartFamily::Treemap, LABEL_VALUE, DescendingValue, Agg::SumSegments, Top, AxisLayout::None, SLICES, "{value} by {label}"),
];

/// Table entry for a family.
pub fn lookup(family: ChartFamily) -> &'static FamilyEntry {
    // TABLE follows declaration order
    &TABLE[family as usize]
}

/// Every entry, in declaration order.
pub fn entries() -> &'static [FamilyEntry] {
    &TABLE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_family_order() {
        for family in ChartFamily::ALL {
            assert_eq!(lookup(family).family, family);
        }
        assert_eq!(entries().len(), ChartFamily::ALL.len());
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("stackedbar".parse::<ChartFamily>().unwrap(), ChartFamily::StackedBar);
        assert_eq!("polarArea".parse::<ChartFamily>().unwrap(), ChartFamily::PolarArea);
        assert_eq!(" PIE ".parse::<ChartFamily>().unwrap(), ChartFamily::Pie);
    }

    #[test]
    fn test_parse_unknown_family() {
        let err = "not-a-real-chart".parse::<ChartFamily>().unwrap_err();
        assert_eq!(
            err,
            ChartError::UnsupportedChartType { family: "not-a-real-chart".to_string() }
        );
    }

    #[test]
    fn test_pie_family_legend_bottom() {
        assert_eq!(lookup(ChartFamily::Pie).legend, LegendPosition::Bottom);
        assert_eq!(lookup(ChartFamily::Doughnut).legend, LegendPosition::Bottom);
        assert_eq!(lookup(ChartFamily::Bar).legend, LegendPosition::Top);
    }

    #[test]
    fn test_grouped_families_sort_lexicographically() {
        for family in [ChartFamily::StackedBar, ChartFamily::GroupedBar, ChartFamily::StackedArea] {
            let e = lookup(family);
            assert_eq!(e.ordering, OrderingPolicy::Lexicographic);
            assert_eq!(e.aggregation, AggregationPolicy::Pivot);
        }
    }

    #[test]
    fn test_family_serde_name() {
        assert_eq!(serde_json::to_value(ChartFamily::KpiCard).unwrap(), "kpiCard");
        assert_eq!(serde_json::to_value(Role::GroupBy).unwrap(), "groupByColumn");
    }
}
