use crate::family::{AxisLayout, FamilyEntry, Role};
use crate::ir::{AxisPosition, AxisScale, ChartStyle, ResolvedBindings, ScaleKind, SeriesData};

/// Build the axes for the emitted series data.
pub fn build_scales(
    data: &SeriesData,
    entry: &FamilyEntry,
    style: &ChartStyle,
    bindings: &ResolvedBindings,
) -> Vec<AxisScale> {
    let stacked = entry.traits.stacked;
    let zero = entry.traits.zero_baseline;

    match entry.axes {
        AxisLayout::None => Vec::new(),
        AxisLayout::Radial => {
            let mm = value_range(data, false);
            vec![linear_axis("r", AxisPosition::Chart, None, false, true, mm)
                .with_kind(ScaleKind::RadialLinear)]
        }
        AxisLayout::Cartesian => match data {
            SeriesData::Points { .. } => {
                let (x_mm, y_mm) = point_ranges(data);
                vec![
                    linear_axis("x", AxisPosition::Bottom, style.x_axis_title.clone(), false, false, x_mm),
                    linear_axis("y", AxisPosition::Left, style.y_axis_title.clone(), false, false, y_mm),
                ]
            }
            SeriesData::Matrix { .. } => vec![
                category_axis("x", AxisPosition::Bottom, None, false),
                category_axis("y", AxisPosition::Left, None, false),
            ],
            SeriesData::Categorical { series, .. } if series.iter().any(|s| s.axis.is_some()) => {
                let mut left = MinMax::default();
                let mut right = MinMax::default();
                for s in series {
                    let target = if s.axis.as_deref() == Some("y1") { &mut right } else { &mut left };
                    s.values.iter().for_each(|v| target.push(*v));
                }
                vec![
                    category_axis("x", AxisPosition::Bottom, style.x_axis_title.clone(), false),
                    linear_axis("y", AxisPosition::Left, bindings.get(Role::Bar).map(String::from), false, zero, left),
                    linear_axis("y1", AxisPosition::Right, bindings.get(Role::Line).map(String::from), false, false, right),
                ]
            }
            _ if entry.traits.horizontal => vec![
                linear_axis("x", AxisPosition::Bottom, style.x_axis_title.clone(), stacked, zero, value_range(data, stacked)),
                category_axis("y", AxisPosition::Left, style.y_axis_title.clone(), stacked),
            ],
            _ => vec![
                category_axis("x", AxisPosition::Bottom, style.x_axis_title.clone(), stacked),
                linear_axis("y", AxisPosition::Left, style.y_axis_title.clone(), stacked, zero, value_range(data, stacked)),
            ],
        },
    }
}

impl AxisScale {
    fn with_kind(mut self, kind: ScaleKind) -> Self {
        self.kind = kind;
        self
    }
}

fn category_axis(id: &str, position: AxisPosition, title: Option<String>, stacked: bool) -> AxisScale {
    AxisScale {
        id: id.to_string(),
        kind: ScaleKind::Category,
        position,
        title,
        stacked,
        begin_at_zero: false,
        min: None,
        max: None,
    }
}

fn linear_axis(
    id: &str,
    position: AxisPosition,
    title: Option<String>,
    stacked: bool,
    begin_at_zero: bool,
    mut mm: MinMax,
) -> AxisScale {
    let (min, max) = if mm.is_empty() {
        (None, None)
    } else {
        if begin_at_zero {
            mm.push(0.0);
        }
        let (mut min, mut max) = pad_range(mm.min, mm.max);
        // Padding never pushes a zero baseline past zero
        if begin_at_zero && mm.min >= 0.0 {
            min = 0.0;
        }
        if begin_at_zero && mm.max <= 0.0 {
            max = 0.0;
        }
        (Some(min), Some(max))
    };

    AxisScale {
        id: id.to_string(),
        kind: ScaleKind::Linear,
        position,
        title,
        stacked,
        begin_at_zero,
        min,
        max,
    }
}

#[derive(Debug, Clone, Copy)]
struct MinMax {
    min: f64,
    max: f64,
}

impl Default for MinMax {
    fn default() -> Self {
        MinMax { min: f64::INFINITY, max: f64::NEG_INFINITY }
    }
}

impl MinMax {
    fn push(&mut self, v: f64) {
        if !v.is_finite() { return; }
        if v < self.min { self.min = v; }
        if v > self.max { self.max = v; }
    }

    fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

/// Range of the value axis. Stacked data uses per-category stack totals.
fn value_range(data: &SeriesData, stacked: bool) -> MinMax {
    let mut mm = MinMax::default();
    match data {
        SeriesData::Categorical { labels, series } => {
            if stacked {
                for i in 0..labels.len() {
                    let (pos, neg) = series.iter().filter_map(|s| s.values.get(i)).fold(
                        (0.0, 0.0),
                        |(p, n), v| if *v >= 0.0 { (p + v, n) } else { (p, n + v) },
                    );
                    mm.push(pos);
                    mm.push(neg);
                }
            } else {
                series.iter().flat_map(|s| s.values.iter()).for_each(|v| mm.push(*v));
            }
        }
        SeriesData::Waterfall { items } => {
            for item in items {
                mm.push(item.cumulative_start);
                mm.push(item.cumulative_end);
            }
        }
        SeriesData::Distribution { groups } => {
            for g in groups {
                mm.push(g.min);
                mm.push(g.max);
            }
        }
        SeriesData::Bullets { items } => {
            for item in items {
                mm.push(item.value);
                mm.push(item.target);
            }
        }
        SeriesData::Segments { items } => items.iter().for_each(|s| mm.push(s.value)),
        SeriesData::Points { .. }
        | SeriesData::Matrix { .. }
        | SeriesData::Gauge(_)
        | SeriesData::Kpi(_)
        | SeriesData::Flow { .. } => {}
    }
    mm
}

fn point_ranges(data: &SeriesData) -> (MinMax, MinMax) {
    let mut x = MinMax::default();
    let mut y = MinMax::default();
    if let SeriesData::Points { series } = data {
        for p in series.iter().flat_map(|s| s.points.iter()) {
            x.push(p.x);
            y.push(p.y);
        }
    }
    (x, y)
}

fn pad_range(min: f64, max: f64) -> (f64, f64) {
    if min == max {
        (min - 1.0, max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding, max + padding)
    }
}
