use crate::family::{ChartFamily, LegendPosition, Role};
use crate::palette::ColorPalette;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// =============================================================================
// Phase 0: Request
// =============================================================================

/// Caller-supplied bindings, style overrides and family parameters.
/// Every field is optional; absent roles are inferred.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_column: Option<String>,
    #[serde(alias = "groupBy", skip_serializing_if = "Option::is_none")]
    pub group_by_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_column: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend_position: Option<LegendPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_legend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<String>,

    // Family parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bins: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Vec<f64>>,
}

impl ChartOptions {
    /// Explicit column for a role, if the caller gave one.
    pub fn column_for(&self, role: Role) -> Option<&str> {
        let field = match role {
            Role::X => &self.x_column,
            Role::Y => &self.y_column,
            Role::Label => &self.label_column,
            Role::Value => &self.value_column,
            Role::GroupBy => &self.group_by_column,
            Role::Bar => &self.bar_column,
            Role::Line => &self.line_column,
            Role::Size => &self.size_column,
            Role::Target => &self.target_column,
            Role::Source => &self.source_column,
        };
        field.as_deref().filter(|c| !c.is_empty())
    }

    pub fn set_column(&mut self, role: Role, column: impl Into<String>) {
        let field = match role {
            Role::X => &mut self.x_column,
            Role::Y => &mut self.y_column,
            Role::Label => &mut self.label_column,
            Role::Value => &mut self.value_column,
            Role::GroupBy => &mut self.group_by_column,
            Role::Bar => &mut self.bar_column,
            Role::Line => &mut self.line_column,
            Role::Size => &mut self.size_column,
            Role::Target => &mut self.target_column,
            Role::Source => &mut self.source_column,
        };
        *field = Some(column.into());
    }
}

// =============================================================================
// Phase 1: Resolution
// =============================================================================

/// Role → column after explicit options and inference are merged.
/// Roles with no column are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedBindings {
    columns: IndexMap<Role, String>,
}

impl ResolvedBindings {
    pub fn bind(&mut self, role: Role, column: impl Into<String>) {
        self.columns.insert(role, column.into());
    }

    pub fn get(&self, role: Role) -> Option<&str> {
        self.columns.get(&role).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &str)> {
        self.columns.iter().map(|(r, c)| (*r, c.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// =============================================================================
// Phase 2: Transformation
// =============================================================================

/// Family-shaped data ready for a rendering library.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SeriesData {
    /// Shared labels with one or more aligned value series.
    Categorical { labels: Vec<String>, series: Vec<Series> },
    /// `{x, y[, r]}` points.
    Points { series: Vec<PointSeries> },
    Waterfall { items: Vec<WaterfallItem> },
    /// Ordered label/value segments (funnel, treemap).
    Segments { items: Vec<Segment> },
    /// Per-group five-number summaries, with densities for violins.
    Distribution { groups: Vec<DistributionGroup> },
    /// Square matrix over `columns`.
    Matrix { columns: Vec<String>, values: Vec<Vec<f64>> },
    Gauge(GaugeData),
    Kpi(KpiData),
    Bullets { items: Vec<BulletItem> },
    Flow { nodes: Vec<String>, links: Vec<FlowLink> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
    /// Axis id for families with more than one value axis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis: Option<String>,
    /// Mark type when it differs per series (`bar` / `line`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark: Option<String>,
    pub background_color: Vec<String>,
    pub border_color: Vec<String>,
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
            axis: None,
            mark: None,
            background_color: Vec::new(),
            border_color: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointSeries {
    pub name: String,
    pub points: Vec<Point>,
    pub background_color: Vec<String>,
    pub border_color: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterfallItem {
    pub label: String,
    pub value: f64,
    pub cumulative_start: f64,
    pub cumulative_end: f64,
    pub is_positive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub label: String,
    pub value: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionGroup {
    pub name: String,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<DensityCurve>,
}

/// KDE sampled on a fixed grid; `density` is scaled to 0..=1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityCurve {
    pub y: Vec<f64>,
    pub density: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GaugeStatus {
    Poor,
    Fair,
    Good,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeData {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub percentage: f64,
    pub thresholds: Vec<f64>,
    pub status: GaugeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiData {
    pub total: f64,
    pub mean: f64,
    pub latest: f64,
    pub trend: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletItem {
    pub label: String,
    pub value: f64,
    pub target: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowLink {
    pub source: String,
    pub target: String,
    pub value: f64,
}

// =============================================================================
// Phase 3: Scaling
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScaleKind {
    Category,
    Linear,
    RadialLinear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisPosition {
    Bottom,
    Left,
    Right,
    Chart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisScale {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ScaleKind,
    pub position: AxisPosition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub stacked: bool,
    pub begin_at_zero: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

// =============================================================================
// Phase 4: Styling
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartStyle {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis_title: Option<String>,
    pub legend_position: LegendPosition,
    pub show_legend: bool,
    pub palette: ColorPalette,
    pub stacked: bool,
    pub fill: bool,
    pub stepped: bool,
    /// `"y"` for horizontal families.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_axis: Option<String>,
}

// =============================================================================
// Output
// =============================================================================

/// Declarative, renderer-agnostic chart description.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    pub family: ChartFamily,
    pub bindings: ResolvedBindings,
    pub series_data: SeriesData,
    pub scales: Vec<AxisScale>,
    pub style: ChartStyle,
}
