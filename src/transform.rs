use crate::coerce::{coerce_numeric_or_zero, is_missing, is_valid_numeric, to_text};
use crate::config::EngineConfig;
use crate::data::{Row, RowSet};
use crate::error::{ChartError, Result};
use crate::family::{AggregationPolicy, FamilyEntry, OrderingPolicy, Role};
use crate::ir::{
    BulletItem, ChartOptions, DensityCurve, DistributionGroup, FlowLink, GaugeData, GaugeStatus,
    KpiData, Point, PointSeries, ResolvedBindings, Segment, Series, SeriesData, WaterfallItem,
};
use crate::resolve::ColumnPartition;
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use tracing::{debug, trace};

/// Upper bound for the `bins` option and `histogramBins`.
pub const MAX_HISTOGRAM_BINS: usize = 10_000;

/// Everything the transformation phase reads besides the rows.
pub struct TransformContext<'a> {
    pub entry: &'a FamilyEntry,
    pub bindings: &'a ResolvedBindings,
    pub options: &'a ChartOptions,
    pub config: &'a EngineConfig,
    pub partition: &'a ColumnPartition,
}

impl TransformContext<'_> {
    fn column(&self, role: Role) -> &str {
        self.bindings.get(role).unwrap_or_default()
    }

    fn cell<'r>(&self, row: &'r Row, role: Role) -> Option<&'r Value> {
        self.bindings.get(role).and_then(|c| row.get(c))
    }

    fn number(&self, row: &Row, role: Role) -> f64 {
        coerce_numeric_or_zero(self.cell(row, role))
    }

    fn text(&self, row: &Row, role: Role) -> String {
        self.cell(row, role).map(to_text).unwrap_or_default()
    }

    fn no_valid_data(&self) -> ChartError {
        ChartError::NoValidData {
            family: self.entry.family.to_string(),
        }
    }
}

/// Main entry point: filter the rows and shape them for the family.
pub fn apply_transformations(rows: &RowSet, ctx: &TransformContext) -> Result<SeriesData> {
    let valid = filter_rows(rows, ctx.entry, ctx.bindings);
    debug!(
        family = %ctx.entry.family,
        total = rows.len(),
        valid = valid.len(),
        "filtered rows"
    );
    if valid.is_empty() {
        return Err(ctx.no_valid_data());
    }

    trace!(family = %ctx.entry.family, aggregation = ?ctx.entry.aggregation, "dispatch");
    match ctx.entry.aggregation {
        AggregationPolicy::RowSeries { label, value } => Ok(row_series(&valid, ctx, label, value)),
        AggregationPolicy::RowPoints { size } => Ok(row_points(&valid, ctx, size)),
        AggregationPolicy::Sum { key, measure } => Ok(sum_by_key(&valid, ctx, key, measure)),
        AggregationPolicy::Pivot => Ok(pivot(&valid, ctx)),
        AggregationPolicy::PairedRows => Ok(paired_rows(&valid, ctx)),
        AggregationPolicy::Cumulative => Ok(cumulative(&valid, ctx)),
        AggregationPolicy::RowSegments => Ok(segments(&valid, ctx, false)),
        AggregationPolicy::SumSegments => Ok(segments(&valid, ctx, true)),
        AggregationPolicy::Bin => compute_bin_stat(&valid, ctx),
        AggregationPolicy::Quartiles => Ok(compute_distribution_stat(&valid, ctx, false)),
        AggregationPolicy::Density => Ok(compute_distribution_stat(&valid, ctx, true)),
        AggregationPolicy::Correlation => compute_correlation(&valid, ctx),
        AggregationPolicy::Gauge => compute_gauge(&valid, ctx),
        AggregationPolicy::Kpi => Ok(compute_kpi(&valid, ctx)),
        AggregationPolicy::Bullets => Ok(bullets(&valid, ctx)),
        AggregationPolicy::Links => Ok(links(&valid, ctx)),
    }
}

/// Keep rows whose bound cells are present, and numeric where the role is a
/// measure. A required role with no column rejects every row.
pub fn filter_rows<'r>(
    rows: &'r RowSet,
    entry: &FamilyEntry,
    bindings: &ResolvedBindings,
) -> Vec<&'r Row> {
    if entry
        .roles
        .iter()
        .any(|rule| rule.required && bindings.get(rule.role).is_none())
    {
        return Vec::new();
    }

    rows.iter()
        .filter(|row| {
            entry.roles.iter().all(|rule| match bindings.get(rule.role) {
                Some(column) => {
                    let cell = row.get(column);
                    !is_missing(cell) && (!rule.measure || is_valid_numeric(cell))
                }
                None => true,
            })
        })
        .collect()
}

fn row_series(rows: &[&Row], ctx: &TransformContext, label: Role, value: Role) -> SeriesData {
    let labels = rows.iter().map(|r| ctx.text(r, label)).collect();
    let values = rows.iter().map(|r| ctx.number(r, value)).collect();
    SeriesData::Categorical {
        labels,
        series: vec![Series::new(ctx.column(value), values)],
    }
}

/// Radius whose area grows linearly with `value`.
pub fn bubble_radius(value: f64, scale: f64) -> f64 {
    value.max(0.0).sqrt() * scale
}

fn row_points(rows: &[&Row], ctx: &TransformContext, size: Option<Role>) -> SeriesData {
    let k = ctx.config.bubble_radius_scale;
    let points = rows
        .iter()
        .map(|r| Point {
            x: ctx.number(r, Role::X),
            y: ctx.number(r, Role::Y),
            r: size.map(|s| bubble_radius(ctx.number(r, s), k)),
        })
        .collect();
    SeriesData::Points {
        series: vec![PointSeries {
            name: ctx.column(Role::Y).to_string(),
            points,
            background_color: Vec::new(),
            border_color: Vec::new(),
        }],
    }
}

/// Sum `measure` per distinct `key`, ordered by the family's policy.
fn sum_by_key(rows: &[&Row], ctx: &TransformContext, key: Role, measure: Role) -> SeriesData {
    let mut sums = group_sums(rows, ctx, key, measure);
    order_keys(&mut sums, ctx.entry.ordering);
    let (labels, values) = sums.into_iter().unzip();
    SeriesData::Categorical {
        labels,
        series: vec![Series::new(ctx.column(measure), values)],
    }
}

fn group_sums(rows: &[&Row], ctx: &TransformContext, key: Role, measure: Role) -> IndexMap<String, f64> {
    let mut sums: IndexMap<String, f64> = IndexMap::new();
    for row in rows {
        *sums.entry(ctx.text(row, key)).or_default() += ctx.number(row, measure);
    }
    sums
}

fn order_keys(sums: &mut IndexMap<String, f64>, ordering: OrderingPolicy) {
    match ordering {
        OrderingPolicy::Lexicographic => sums.sort_keys(),
        OrderingPolicy::DescendingValue => sums.sort_by(|_, a, _, b| b.total_cmp(a)),
        OrderingPolicy::FirstSeen | OrderingPolicy::RowOrder => {}
    }
}

/// Dense category × series grid; missing combinations are 0.
fn pivot(rows: &[&Row], ctx: &TransformContext) -> SeriesData {
    let mut cells: IndexMap<(String, String), f64> = IndexMap::new();
    let mut categories: IndexSet<String> = IndexSet::new();
    let mut groups: IndexSet<String> = IndexSet::new();

    for row in rows {
        let category = ctx.text(row, Role::X);
        let group = ctx.text(row, Role::GroupBy);
        categories.insert(category.clone());
        groups.insert(group.clone());
        *cells.entry((category, group)).or_default() += ctx.number(row, Role::Value);
    }

    if ctx.entry.ordering == OrderingPolicy::Lexicographic {
        categories.sort();
        groups.sort();
    }

    let mut grid = vec![vec![0.0; categories.len()]; groups.len()];
    for ((category, group), sum) in &cells {
        if let (Some(c), Some(g)) = (categories.get_index_of(category), groups.get_index_of(group)) {
            grid[g][c] = *sum;
        }
    }

    let series = groups
        .iter()
        .zip(grid)
        .map(|(group, values)| Series::new(group.clone(), values))
        .collect();

    SeriesData::Categorical {
        labels: categories.into_iter().collect(),
        series,
    }
}

/// First N rows verbatim: bars on the left axis, line on the right.
fn paired_rows(rows: &[&Row], ctx: &TransformContext) -> SeriesData {
    let taken = &rows[..rows.len().min(ctx.config.mixed_row_limit)];
    let labels = taken.iter().map(|r| ctx.text(r, Role::X)).collect();

    let mut bar = Series::new(
        ctx.column(Role::Bar),
        taken.iter().map(|r| ctx.number(r, Role::Bar)).collect(),
    );
    bar.axis = Some("y".to_string());
    bar.mark = Some("bar".to_string());

    let mut line = Series::new(
        ctx.column(Role::Line),
        taken.iter().map(|r| ctx.number(r, Role::Line)).collect(),
    );
    line.axis = Some("y1".to_string());
    line.mark = Some("line".to_string());

    SeriesData::Categorical {
        labels,
        series: vec![bar, line],
    }
}

/// Running total over the first N rows; duplicates are not merged.
fn cumulative(rows: &[&Row], ctx: &TransformContext) -> SeriesData {
    let mut running = 0.0;
    let items = rows
        .iter()
        .take(ctx.config.waterfall_row_limit)
        .map(|row| {
            let value = ctx.number(row, Role::Value);
            let start = running;
            running += value;
            WaterfallItem {
                label: ctx.text(row, Role::Label),
                value,
                cumulative_start: start,
                cumulative_end: running,
                is_positive: value >= 0.0,
            }
        })
        .collect();
    SeriesData::Waterfall { items }
}

fn segments(rows: &[&Row], ctx: &TransformContext, merge: bool) -> SeriesData {
    let mut pairs: Vec<(String, f64)> = if merge {
        group_sums(rows, ctx, Role::Label, Role::Value).into_iter().collect()
    } else {
        rows.iter()
            .map(|r| (ctx.text(r, Role::Label), ctx.number(r, Role::Value)))
            .collect()
    };
    if ctx.entry.ordering == OrderingPolicy::DescendingValue {
        // Stable, so equal values keep row order
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
    }
    let items = pairs
        .into_iter()
        .map(|(label, value)| Segment {
            label,
            value,
            color: String::new(),
        })
        .collect();
    SeriesData::Segments { items }
}

fn measure_values(rows: &[&Row], ctx: &TransformContext, role: Role) -> Vec<f64> {
    rows.iter().map(|r| ctx.number(r, role)).collect()
}

fn compute_bin_stat(rows: &[&Row], ctx: &TransformContext) -> Result<SeriesData> {
    let bin_count = ctx.options.bins.unwrap_or(ctx.config.histogram_bins);
    if bin_count == 0 || bin_count > MAX_HISTOGRAM_BINS {
        return Err(ChartError::InvalidOption {
            name: "bins".to_string(),
            reason: format!("must be between 1 and {}", MAX_HISTOGRAM_BINS),
        });
    }

    let values = measure_values(rows, ctx, Role::Value);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    // Halved so that max - min cannot overflow for finite inputs
    let half_span = max / 2.0 - min / 2.0;

    // Zero range collapses to a single bin
    let bin_count = if half_span == 0.0 { 1 } else { bin_count };
    let n = bin_count as f64;

    let mut counts = vec![0.0; bin_count];
    for v in &values {
        let offset = if half_span == 0.0 { 0.0 } else { (v / 2.0 - min / 2.0) / half_span };
        let idx = ((offset * n).floor() as usize).min(bin_count - 1);
        counts[idx] += 1.0;
    }

    let edge = |i: usize| {
        let t = i as f64 / n;
        min * (1.0 - t) + max * t
    };
    let labels = (0..bin_count)
        .map(|i| format!("{:.2}-{:.2}", edge(i), edge(i + 1)))
        .collect();

    Ok(SeriesData::Categorical {
        labels,
        series: vec![Series::new(ctx.column(Role::Value), counts)],
    })
}

fn compute_distribution_stat(rows: &[&Row], ctx: &TransformContext, with_density: bool) -> SeriesData {
    let mut grouped: IndexMap<String, Vec<f64>> = IndexMap::new();
    let grouping = ctx.bindings.get(Role::GroupBy).is_some();
    for row in rows {
        let name = if grouping {
            ctx.text(row, Role::GroupBy)
        } else {
            ctx.column(Role::Value).to_string()
        };
        grouped.entry(name).or_default().push(ctx.number(row, Role::Value));
    }
    if ctx.entry.ordering == OrderingPolicy::Lexicographic {
        grouped.sort_keys();
    }

    let groups = grouped
        .into_iter()
        .map(|(name, mut ys)| {
            ys.sort_by(f64::total_cmp);
            summarize(name, &ys, with_density)
        })
        .collect();
    SeriesData::Distribution { groups }
}

/// Five-number summary with Tukey whiskers; `sorted` must be ascending and non-empty.
fn summarize(name: String, sorted: &[f64], with_density: bool) -> DistributionGroup {
    let q1 = percentile(sorted, 0.25);
    let median = percentile(sorted, 0.50);
    let q3 = percentile(sorted, 0.75);
    let iqr = q3 - q1;

    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    // Whiskers: extremes of the data within the fences
    let lower_whisker = sorted.iter().copied().find(|v| *v >= lower_fence).unwrap_or(q1);
    let upper_whisker = sorted.iter().rev().copied().find(|v| *v <= upper_fence).unwrap_or(q3);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < lower_fence || *v > upper_fence)
        .collect();

    let density = with_density.then(|| {
        let bandwidth = silverman_bandwidth(sorted);
        let (y, density) = compute_kde(sorted, bandwidth);
        DensityCurve { y, density }
    });

    DistributionGroup {
        name,
        count: sorted.len(),
        min: sorted.first().copied().unwrap_or_default(),
        max: sorted.last().copied().unwrap_or_default(),
        q1,
        median,
        q3,
        lower_whisker,
        upper_whisker,
        outliers,
        density,
    }
}

/// Linear-interpolated percentile of ascending data.
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 { return 0.0; }
    if n == 1 { return sorted_data[0]; }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

/// Silverman's rule of thumb for bandwidth selection
fn silverman_bandwidth(sorted: &[f64]) -> f64 {
    let n = sorted.len() as f64;
    if n < 2.0 { return 1.0; }

    let mean = sorted.iter().sum::<f64>() / n;
    let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    let iqr = percentile(sorted, 0.75) - percentile(sorted, 0.25);

    // h = 0.9 * min(std, IQR/1.34) * n^(-1/5)
    let scale = if iqr > 0.0 { std_dev.min(iqr / 1.34) } else { std_dev };
    if scale <= 0.0 { return 1.0; }
    0.9 * scale * n.powf(-0.2)
}

fn gaussian_kernel(u: f64) -> f64 {
    const SQRT_2PI: f64 = 2.5066282746310002;
    (-0.5 * u * u).exp() / SQRT_2PI
}

/// Gaussian KDE on a fixed grid, density scaled to 0..=1.
fn compute_kde(data: &[f64], bandwidth: f64) -> (Vec<f64>, Vec<f64>) {
    const GRID_POINTS: usize = 128;

    let n = data.len() as f64;
    if n == 0.0 { return (vec![], vec![]); }

    let min_y = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max_y = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    // Extend range for smooth tails
    let extend = 3.0 * bandwidth;
    let y_start = min_y - extend;
    let range = (max_y + extend) - y_start;
    if range <= 0.0 { return (vec![min_y], vec![1.0]); }

    let step = range / (GRID_POINTS - 1) as f64;
    let grid_y: Vec<f64> = (0..GRID_POINTS).map(|i| y_start + i as f64 * step).collect();
    let mut density: Vec<f64> = grid_y
        .iter()
        .map(|y| {
            data.iter().map(|xi| gaussian_kernel((y - xi) / bandwidth)).sum::<f64>() / (n * bandwidth)
        })
        .collect();

    let max_density = density.iter().copied().fold(0.0f64, f64::max);
    if max_density > 0.0 {
        for d in &mut density {
            *d /= max_density;
        }
    }

    (grid_y, density)
}

fn compute_correlation(rows: &[&Row], ctx: &TransformContext) -> Result<SeriesData> {
    let columns = &ctx.partition.numerical;
    if columns.len() < 2 {
        return Err(ctx.no_valid_data());
    }

    let n = columns.len();
    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        values[i][i] = 1.0;
        for j in (i + 1)..n {
            let r = pearson(rows, &columns[i], &columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(SeriesData::Matrix {
        columns: columns.clone(),
        values,
    })
}

/// Pearson r over rows where both cells are valid numbers; 0 without variance.
fn pearson(rows: &[&Row], a: &str, b: &str) -> f64 {
    let pairs: Vec<(f64, f64)> = rows
        .iter()
        .filter(|r| is_valid_numeric(r.get(a)) && is_valid_numeric(r.get(b)))
        .map(|r| (coerce_numeric_or_zero(r.get(a)), coerce_numeric_or_zero(r.get(b))))
        .collect();
    if pairs.len() < 2 {
        return 0.0;
    }

    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }
    if var_a == 0.0 || var_b == 0.0 {
        return 0.0;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}

fn compute_gauge(rows: &[&Row], ctx: &TransformContext) -> Result<SeriesData> {
    let values = measure_values(rows, ctx, Role::Value);
    let value = values.iter().sum::<f64>() / values.len() as f64;

    let min = ctx.options.min.unwrap_or(0.0);
    let max = ctx.options.max.unwrap_or(100.0);
    if max <= min {
        return Err(ChartError::InvalidOption {
            name: "max".to_string(),
            reason: format!("must be greater than min ({})", min),
        });
    }

    let thresholds = ctx.options.thresholds.clone().unwrap_or_else(|| vec![30.0, 70.0]);
    let (low, high) = match thresholds.as_slice() {
        [low, high, ..] if low <= high => (*low, *high),
        _ => {
            return Err(ChartError::InvalidOption {
                name: "thresholds".to_string(),
                reason: "expected two ascending percentages".to_string(),
            })
        }
    };

    let percentage = ((value - min) / (max - min) * 100.0).clamp(0.0, 100.0);
    let status = if percentage < low {
        GaugeStatus::Poor
    } else if percentage < high {
        GaugeStatus::Fair
    } else {
        GaugeStatus::Good
    };

    Ok(SeriesData::Gauge(GaugeData {
        value,
        min,
        max,
        percentage,
        thresholds,
        status,
    }))
}

fn compute_kpi(rows: &[&Row], ctx: &TransformContext) -> SeriesData {
    let values = measure_values(rows, ctx, Role::Value);
    let total: f64 = values.iter().sum();
    let latest = values.last().copied().unwrap_or_default();
    let trend = match values.len() {
        0 | 1 => 0.0,
        n => latest - values[n - 2],
    };
    SeriesData::Kpi(KpiData {
        total,
        mean: total / values.len().max(1) as f64,
        latest,
        trend,
        count: values.len(),
    })
}

fn bullets(rows: &[&Row], ctx: &TransformContext) -> SeriesData {
    let items = rows
        .iter()
        .take(ctx.config.bullet_row_limit)
        .map(|r| BulletItem {
            label: ctx.text(r, Role::Label),
            value: ctx.number(r, Role::Value),
            target: ctx.number(r, Role::Target),
        })
        .collect();
    SeriesData::Bullets { items }
}

fn links(rows: &[&Row], ctx: &TransformContext) -> SeriesData {
    let mut nodes: IndexSet<String> = IndexSet::new();
    let mut sums: IndexMap<(String, String), f64> = IndexMap::new();
    for row in rows {
        let source = ctx.text(row, Role::Source);
        let target = ctx.text(row, Role::Target);
        nodes.insert(source.clone());
        nodes.insert(target.clone());
        *sums.entry((source, target)).or_default() += ctx.number(row, Role::Value);
    }
    let links = sums
        .into_iter()
        .map(|((source, target), value)| FlowLink { source, target, value })
        .collect();
    SeriesData::Flow {
        nodes: nodes.into_iter().collect(),
        links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::SingleSample;
    use crate::family::{lookup, ChartFamily};
    use crate::resolve::resolve_bindings;
    use serde_json::json;

    fn make_data() -> RowSet {
        RowSet::from_json(&json!([
            {"cat": "B", "grp": "x", "val": 5, "other": 1},
            {"cat": "A", "grp": "y", "val": 3, "other": 2},
            {"cat": "B", "grp": "y", "val": "oops", "other": 3},
            {"cat": "A", "grp": "x", "val": 4, "other": 4},
            {"cat": null, "grp": "x", "val": 9, "other": 5}
        ]))
        .unwrap()
    }

    fn run(family: ChartFamily, rows: &RowSet, options: &ChartOptions) -> Result<SeriesData> {
        run_with(&EngineConfig::default(), family, rows, options)
    }

    fn run_with(
        config: &EngineConfig,
        family: ChartFamily,
        rows: &RowSet,
        options: &ChartOptions,
    ) -> Result<SeriesData> {
        let partition = ColumnPartition::infer(rows, &SingleSample::default());
        let entry = lookup(family);
        let bindings = resolve_bindings(entry, options, &partition, rows, false)?;
        let ctx = TransformContext {
            entry,
            bindings: &bindings,
            options,
            config,
            partition: &partition,
        };
        apply_transformations(rows, &ctx)
    }

    #[test]
    fn test_filter_drops_missing_and_invalid() {
        let rows = make_data();
        let options = ChartOptions::default();
        match run(ChartFamily::Bar, &rows, &options).unwrap() {
            SeriesData::Categorical { labels, series } => {
                assert_eq!(labels, vec!["B", "A"]);
                assert_eq!(series[0].values, vec![5.0, 7.0]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_pie_first_seen_sum() {
        let rows = RowSet::from_json(&json!([
            {"k": "z", "v": 1}, {"k": "a", "v": 2}, {"k": "z", "v": 3}
        ]))
        .unwrap();
        match run(ChartFamily::Pie, &rows, &ChartOptions::default()).unwrap() {
            SeriesData::Categorical { labels, series } => {
                assert_eq!(labels, vec!["z", "a"]);
                assert_eq!(series[0].values, vec![4.0, 2.0]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_pivot_dense_fill() {
        let rows = make_data();
        let options = ChartOptions {
            x_column: Some("cat".into()),
            group_by_column: Some("grp".into()),
            value_column: Some("val".into()),
            ..Default::default()
        };
        match run(ChartFamily::GroupedBar, &rows, &options).unwrap() {
            SeriesData::Categorical { labels, series } => {
                assert_eq!(labels, vec!["A", "B"]);
                assert_eq!(series[0].name, "x");
                assert_eq!(series[0].values, vec![4.0, 5.0]);
                assert_eq!(series[1].name, "y");
                assert_eq!(series[1].values, vec![3.0, 0.0]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_waterfall_running_total() {
        let rows = RowSet::from_json(&json!([
            {"step": "start", "delta": 10},
            {"step": "loss", "delta": -4},
            {"step": "gain", "delta": 6}
        ]))
        .unwrap();
        match run(ChartFamily::Waterfall, &rows, &ChartOptions::default()).unwrap() {
            SeriesData::Waterfall { items } => {
                assert_eq!(items[0].cumulative_start, 0.0);
                assert_eq!(items[1].cumulative_start, 10.0);
                assert_eq!(items[1].cumulative_end, 6.0);
                assert!(!items[1].is_positive);
                assert_eq!(items[2].cumulative_end, 12.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_funnel_keeps_duplicates_sorted() {
        let rows = RowSet::from_json(&json!([
            {"stage": "a", "n": 10}, {"stage": "b", "n": 50}, {"stage": "a", "n": 30}
        ]))
        .unwrap();
        match run(ChartFamily::Funnel, &rows, &ChartOptions::default()).unwrap() {
            SeriesData::Segments { items } => {
                let values: Vec<f64> = items.iter().map(|s| s.value).collect();
                assert_eq!(values, vec![50.0, 30.0, 10.0]);
                assert_eq!(items.len(), 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_treemap_merges_labels() {
        let rows = RowSet::from_json(&json!([
            {"stage": "a", "n": 10}, {"stage": "b", "n": 25}, {"stage": "a", "n": 30}
        ]))
        .unwrap();
        match run(ChartFamily::Treemap, &rows, &ChartOptions::default()).unwrap() {
            SeriesData::Segments { items } => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].label, "a");
                assert_eq!(items[0].value, 40.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_histogram_bins() {
        let rows = RowSet::from_json(&json!([{"v": 0}, {"v": 5}, {"v": 10}, {"v": 10}])).unwrap();
        let options = ChartOptions { bins: Some(2), ..Default::default() };
        match run(ChartFamily::Histogram, &rows, &options).unwrap() {
            SeriesData::Categorical { labels, series } => {
                assert_eq!(labels, vec!["0.00-5.00", "5.00-10.00"]);
                assert_eq!(series[0].values, vec![1.0, 3.0]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_histogram_zero_range_single_bin() {
        let rows = RowSet::from_json(&json!([{"v": 3}, {"v": 3}])).unwrap();
        match run(ChartFamily::Histogram, &rows, &ChartOptions::default()).unwrap() {
            SeriesData::Categorical { labels, series } => {
                assert_eq!(labels.len(), 1);
                assert_eq!(series[0].values, vec![2.0]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_histogram_zero_bins_rejected() {
        let rows = RowSet::from_json(&json!([{"v": 3}])).unwrap();
        let options = ChartOptions { bins: Some(0), ..Default::default() };
        let err = run(ChartFamily::Histogram, &rows, &options).unwrap_err();
        assert!(matches!(err, ChartError::InvalidOption { .. }));
    }

    #[test]
    fn test_histogram_huge_bins_rejected() {
        let rows = RowSet::from_json(&json!([{"v": 0}, {"v": 10}])).unwrap();
        let options = ChartOptions { bins: Some(4_611_686_018_427_387_904), ..Default::default() };
        let err = run(ChartFamily::Histogram, &rows, &options).unwrap_err();
        assert!(matches!(err, ChartError::InvalidOption { ref name, .. } if name == "bins"));

        let config = EngineConfig { histogram_bins: MAX_HISTOGRAM_BINS + 1, ..Default::default() };
        let err = run_with(&config, ChartFamily::Histogram, &rows, &ChartOptions::default()).unwrap_err();
        assert!(matches!(err, ChartError::InvalidOption { .. }));

        let options = ChartOptions { bins: Some(MAX_HISTOGRAM_BINS), ..Default::default() };
        assert!(run(ChartFamily::Histogram, &rows, &options).is_ok());
    }

    #[test]
    fn test_histogram_extreme_range() {
        let rows = RowSet::from_json(&json!([{"v": -1e308}, {"v": 1e308}])).unwrap();
        let options = ChartOptions { bins: Some(2), ..Default::default() };
        match run(ChartFamily::Histogram, &rows, &options).unwrap() {
            SeriesData::Categorical { labels, series } => {
                assert_eq!(labels.len(), 2);
                assert!(labels.iter().all(|l| !l.contains("NaN") && !l.contains("inf")));
                assert!(labels[0].ends_with("-0.00"));
                assert_eq!(series[0].values, vec![1.0, 1.0]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    fn numbered_rows(n: usize) -> RowSet {
        let rows: Vec<_> = (0..n)
            .map(|i| json!({"name": format!("r{:02}", i), "a": i, "b": i * 10}))
            .collect();
        RowSet::from_json(&json!(rows)).unwrap()
    }

    #[test]
    fn test_mixed_chart_truncates_and_splits_axes() {
        let rows = numbered_rows(25);
        match run(ChartFamily::MixedChart, &rows, &ChartOptions::default()).unwrap() {
            SeriesData::Categorical { labels, series } => {
                assert_eq!(labels.len(), 20);
                assert_eq!(labels[19], "r19");
                assert_eq!(series.len(), 2);
                assert_eq!(series[0].name, "a");
                assert_eq!(series[0].axis.as_deref(), Some("y"));
                assert_eq!(series[0].mark.as_deref(), Some("bar"));
                assert_eq!(series[1].name, "b");
                assert_eq!(series[1].axis.as_deref(), Some("y1"));
                assert_eq!(series[1].mark.as_deref(), Some("line"));
                assert_eq!(series[1].values[3], 30.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_waterfall_row_limit() {
        let rows = numbered_rows(25);
        match run(ChartFamily::Waterfall, &rows, &ChartOptions::default()).unwrap() {
            SeriesData::Waterfall { items } => {
                assert_eq!(items.len(), 15);
                assert_eq!(items[14].label, "r14");
                assert_eq!(items[14].cumulative_end, (0..15).sum::<usize>() as f64);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bullet_items() {
        let rows = numbered_rows(25);
        match run(ChartFamily::Bullet, &rows, &ChartOptions::default()).unwrap() {
            SeriesData::Bullets { items } => {
                assert_eq!(items.len(), 15);
                assert_eq!(items[2].label, "r02");
                assert_eq!(items[2].value, 2.0);
                assert_eq!(items[2].target, 20.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_horizontal_bar_sums_by_y() {
        let rows = RowSet::from_json(&json!([
            {"cat": "B", "val": 2}, {"cat": "A", "val": 1}, {"cat": "B", "val": 3}
        ]))
        .unwrap();
        match run(ChartFamily::HorizontalBar, &rows, &ChartOptions::default()).unwrap() {
            SeriesData::Categorical { labels, series } => {
                assert_eq!(labels, vec!["B", "A"]);
                assert_eq!(series[0].name, "val");
                assert_eq!(series[0].values, vec![5.0, 1.0]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sequence_families_keep_row_order() {
        let rows = RowSet::from_json(&json!([
            {"t": "2024-01-03", "y": 1},
            {"t": "2024-01-01", "y": 2},
            {"t": "2024-01-03", "y": 4}
        ]))
        .unwrap();
        for family in [ChartFamily::Line, ChartFamily::Area, ChartFamily::StepLine] {
            match run(family, &rows, &ChartOptions::default()).unwrap() {
                SeriesData::Categorical { labels, series } => {
                    assert_eq!(labels, vec!["2024-01-03", "2024-01-01", "2024-01-03"], "{}", family);
                    assert_eq!(series[0].values, vec![1.0, 2.0, 4.0], "{}", family);
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_slice_families_sum_first_seen() {
        let rows = RowSet::from_json(&json!([
            {"k": "z", "v": 1}, {"k": "a", "v": 2}, {"k": "z", "v": 3}
        ]))
        .unwrap();
        for family in [ChartFamily::Doughnut, ChartFamily::Radar, ChartFamily::PolarArea] {
            match run(family, &rows, &ChartOptions::default()).unwrap() {
                SeriesData::Categorical { labels, series } => {
                    assert_eq!(labels, vec!["z", "a"], "{}", family);
                    assert_eq!(series[0].values, vec![4.0, 2.0], "{}", family);
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_boxplot_stats() {
        let rows = RowSet::from_json(&json!([
            {"v": 1}, {"v": 2}, {"v": 3}, {"v": 4}, {"v": 100}
        ]))
        .unwrap();
        match run(ChartFamily::Boxplot, &rows, &ChartOptions::default()).unwrap() {
            SeriesData::Distribution { groups } => {
                let g = &groups[0];
                assert_eq!(g.median, 3.0);
                assert_eq!(g.q1, 2.0);
                assert_eq!(g.q3, 4.0);
                assert_eq!(g.upper_whisker, 4.0);
                assert_eq!(g.outliers, vec![100.0]);
                assert!(g.density.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_violin_density_normalised() {
        let rows = RowSet::from_json(&json!([
            {"g": "b", "v": 1}, {"g": "b", "v": 2}, {"g": "a", "v": 3}, {"g": "a", "v": 5}
        ]))
        .unwrap();
        let options = ChartOptions { group_by_column: Some("g".into()), ..Default::default() };
        match run(ChartFamily::Violin, &rows, &options).unwrap() {
            SeriesData::Distribution { groups } => {
                assert_eq!(groups[0].name, "a");
                let curve = groups[0].density.as_ref().unwrap();
                assert_eq!(curve.y.len(), 128);
                let peak = curve.density.iter().copied().fold(0.0, f64::max);
                assert!((peak - 1.0).abs() < 1e-9);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_correlation_matrix() {
        let rows = RowSet::from_json(&json!([
            {"a": 1, "b": 2, "c": 5}, {"a": 2, "b": 4, "c": 5}, {"a": 3, "b": 6, "c": 5}
        ]))
        .unwrap();
        match run(ChartFamily::Heatmap, &rows, &ChartOptions::default()).unwrap() {
            SeriesData::Matrix { columns, values } => {
                assert_eq!(columns, vec!["a", "b", "c"]);
                assert!((values[0][1] - 1.0).abs() < 1e-9);
                assert_eq!(values[0][2], 0.0);
                assert_eq!(values[2][2], 1.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_correlation_needs_two_numeric_columns() {
        let rows = RowSet::from_json(&json!([{"a": 1, "c": "x"}])).unwrap();
        let err = run(ChartFamily::Heatmap, &rows, &ChartOptions::default()).unwrap_err();
        assert!(matches!(err, ChartError::NoValidData { .. }));
    }

    #[test]
    fn test_gauge_status() {
        let rows = RowSet::from_json(&json!([{"score": 40}, {"score": 60}])).unwrap();
        match run(ChartFamily::Gauge, &rows, &ChartOptions::default()).unwrap() {
            SeriesData::Gauge(g) => {
                assert_eq!(g.value, 50.0);
                assert_eq!(g.percentage, 50.0);
                assert_eq!(g.status, GaugeStatus::Fair);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_kpi_trend() {
        let rows = RowSet::from_json(&json!([{"v": 10}, {"v": 12}, {"v": 9}])).unwrap();
        match run(ChartFamily::KpiCard, &rows, &ChartOptions::default()).unwrap() {
            SeriesData::Kpi(k) => {
                assert_eq!(k.total, 31.0);
                assert_eq!(k.latest, 9.0);
                assert_eq!(k.trend, -3.0);
                assert_eq!(k.count, 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sankey_links_first_seen() {
        let rows = RowSet::from_json(&json!([
            {"from": "web", "to": "cart", "n": 5},
            {"from": "cart", "to": "buy", "n": 2},
            {"from": "web", "to": "cart", "n": 1}
        ]))
        .unwrap();
        match run(ChartFamily::Sankey, &rows, &ChartOptions::default()).unwrap() {
            SeriesData::Flow { nodes, links } => {
                assert_eq!(nodes, vec!["web", "cart", "buy"]);
                assert_eq!(links.len(), 2);
                assert_eq!(links[0].value, 6.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unbound_role_rejects_all_rows() {
        let rows = RowSet::from_json(&json!([{"cat": "A"}])).unwrap();
        let err = run(ChartFamily::Bar, &rows, &ChartOptions::default()).unwrap_err();
        assert!(matches!(err, ChartError::NoValidData { .. }));
    }

    #[test]
    fn test_percentile() {
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0], 0.5), 2.5);
        assert_eq!(percentile(&[7.0], 0.9), 7.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
    }

    #[test]
    fn test_bubble_radius() {
        assert_eq!(bubble_radius(16.0, 2.0), 8.0);
        assert_eq!(bubble_radius(-4.0, 2.0), 0.0);
    }
}
