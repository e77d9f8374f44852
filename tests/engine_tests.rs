use serde_json::json;
use vizspec::classify::ColumnType;
use vizspec::ir::SeriesData;
use vizspec::profile::ColumnStats;
use vizspec::transform::bubble_radius;
use vizspec::{build_chart, profile, ChartError, ChartOptions, Engine, EngineConfig, RowSet};

fn rows(value: serde_json::Value) -> RowSet {
    RowSet::from_json(&value).unwrap()
}

fn options(value: serde_json::Value) -> ChartOptions {
    serde_json::from_value(value).unwrap()
}

fn make_data() -> RowSet {
    rows(json!([
        {"cat": "A", "val": 10},
        {"cat": "A", "val": 5},
        {"cat": "B", "val": 7}
    ]))
}

#[test]
fn test_profile_is_deterministic() {
    let data = rows(json!([
        {"city": "Oslo", "temp": "3.5", "day": "2024-01-01"},
        {"city": "Rome", "temp": "14", "day": "2024-01-02"},
        {"city": "Oslo", "temp": "", "day": "2024-01-03"}
    ]));
    let first = serde_json::to_string(&profile(&data)).unwrap();
    let second = serde_json::to_string(&profile(&data)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_profile_partition_is_complete() {
    let data = rows(json!([
        {"city": "Oslo", "temp": 3.5, "day": "2024-01-01", "flag": true}
    ]));
    let p = profile(&data);
    assert_eq!(p.columns.len(), p.types.len());
    assert!(p.columns.iter().all(|c| p.types.contains_key(c)));
    let summary = p.summary.unwrap();
    assert_eq!(
        summary.numerical_columns + summary.categorical_columns + summary.temporal_columns,
        summary.total_columns
    );
    assert_eq!(summary.temporal_columns, 1);
}

#[test]
fn test_profile_empty_input() {
    let p = profile(&RowSet::default());
    assert_eq!(
        serde_json::to_value(&p).unwrap(),
        json!({"columns": [], "types": {}, "stats": {}})
    );
}

#[test]
fn test_profile_numeric_stats() {
    let data = rows(json!([{"n": 1}, {"n": 2}, {"n": 3}, {"n": null}, {"n": "x"}]));
    let p = profile(&data);
    assert_eq!(p.column_type("n"), Some(ColumnType::Numerical));
    match &p.stats["n"] {
        ColumnStats::Numerical { count, mean, min, max } => {
            assert_eq!(*count, 3);
            assert_eq!(*mean, 2.0);
            assert_eq!((*min, *max), (1.0, 3.0));
        }
        other => panic!("unexpected stats {:?}", other),
    }
}

#[test]
fn test_profile_categories_capped() {
    let data: Vec<_> = (0..15).map(|i| json!({"name": format!("item-{}", i)})).collect();
    let p = profile(&rows(json!(data)));
    match &p.stats["name"] {
        ColumnStats::Categorical { categories, unique_count, .. } => {
            assert_eq!(categories.len(), 10);
            assert_eq!(*unique_count, 15);
        }
        other => panic!("unexpected stats {:?}", other),
    }
}

#[test]
fn test_bar_aggregates_in_first_seen_order() {
    let spec = build_chart(&make_data(), "bar", &options(json!({"xColumn": "cat", "yColumn": "val"}))).unwrap();
    match spec.series_data {
        SeriesData::Categorical { labels, series } => {
            assert_eq!(labels, vec!["A", "B"]);
            assert_eq!(series[0].values, vec![15.0, 7.0]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_stacked_bar_sorted_and_zero_filled() {
    let data = rows(json!([
        {"x": "Q1", "g": "West", "v": 3},
        {"x": "Q2", "g": "East", "v": 2},
        {"x": "Q1", "g": "East", "v": 5}
    ]));
    let spec = build_chart(
        &data,
        "stackedBar",
        &options(json!({"xColumn": "x", "groupByColumn": "g", "valueColumn": "v"})),
    )
    .unwrap();
    match spec.series_data {
        SeriesData::Categorical { labels, series } => {
            assert_eq!(labels, vec!["Q1", "Q2"]);
            let names: Vec<&str> = series.iter().map(|s| s.name.as_str()).collect();
            assert_eq!(names, vec!["East", "West"]);
            assert_eq!(series[0].values, vec![5.0, 2.0]);
            assert_eq!(series[1].values, vec![3.0, 0.0]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_missing_columns_yield_no_valid_data() {
    let err = build_chart(
        &make_data(),
        "bar",
        &options(json!({"xColumn": "missing", "yColumn": "alsoMissing"})),
    )
    .unwrap_err();
    assert!(matches!(err, ChartError::NoValidData { .. }));
}

#[test]
fn test_strict_bindings_yield_column_not_found() {
    let engine = Engine::with_config(EngineConfig { strict_bindings: true, ..Default::default() });
    let err = engine
        .build_chart_named(&make_data(), "bar", &options(json!({"xColumn": "missing"})))
        .unwrap_err();
    assert_eq!(
        err,
        ChartError::ColumnNotFound { role: "xColumn".into(), column: "missing".into() }
    );
}

#[test]
fn test_unsupported_family() {
    let err = build_chart(&make_data(), "not-a-real-chart", &ChartOptions::default()).unwrap_err();
    assert!(matches!(err, ChartError::UnsupportedChartType { .. }));
}

#[test]
fn test_bubble_radius_grows_with_size() {
    let data = rows(json!([
        {"x": 1, "y": 1, "s": 4},
        {"x": 2, "y": 2, "s": 16}
    ]));
    let spec = build_chart(
        &data,
        "bubble",
        &options(json!({"xColumn": "x", "yColumn": "y", "sizeColumn": "s"})),
    )
    .unwrap();
    let k = EngineConfig::default().bubble_radius_scale;
    match spec.series_data {
        SeriesData::Points { series } => {
            let radii: Vec<f64> = series[0].points.iter().map(|p| p.r.unwrap()).collect();
            assert_eq!(radii, vec![2.0 * k, 4.0 * k]);
            assert!(radii[1] > radii[0]);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(bubble_radius(9.0, k) > bubble_radius(8.0, k));
}

#[test]
fn test_waterfall_running_total() {
    let data = rows(json!([
        {"step": "Start", "delta": 100},
        {"step": "Refunds", "delta": -30},
        {"step": "Upsell", "delta": 45},
        {"step": "Start", "delta": 5}
    ]));
    let spec = build_chart(&data, "waterfall", &ChartOptions::default()).unwrap();
    match spec.series_data {
        SeriesData::Waterfall { items } => {
            assert_eq!(items.len(), 4);
            assert_eq!(items[0].cumulative_start, 0.0);
            for pair in items.windows(2) {
                assert_eq!(pair[1].cumulative_start, pair[0].cumulative_end);
                assert_eq!(pair[1].cumulative_end, pair[0].cumulative_end + pair[1].value);
            }
            assert_eq!(items[3].cumulative_end, 120.0);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_funnel_is_non_increasing() {
    let data = rows(json!([
        {"stage": "Visit", "n": 100},
        {"stage": "Buy", "n": 10},
        {"stage": "Cart", "n": 40},
        {"stage": "Cart", "n": 40}
    ]));
    let spec = build_chart(&data, "funnel", &ChartOptions::default()).unwrap();
    match spec.series_data {
        SeriesData::Segments { items } => {
            let values: Vec<f64> = items.iter().map(|i| i.value).collect();
            assert_eq!(values, vec![100.0, 40.0, 40.0, 10.0]);
            assert!(items.iter().all(|i| !i.color.is_empty()));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_inferred_pie_bindings_and_legend() {
    let spec = build_chart(&make_data(), "pie", &ChartOptions::default()).unwrap();
    let json = serde_json::to_value(&spec).unwrap();
    assert_eq!(json["bindings"], json!({"labelColumn": "cat", "valueColumn": "val"}));
    assert_eq!(json["style"]["legendPosition"], "bottom");
    assert_eq!(json["style"]["title"], "val by cat");
    assert_eq!(json["seriesData"]["series"][0]["backgroundColor"].as_array().unwrap().len(), 2);
}

#[test]
fn test_family_names_are_case_insensitive() {
    let spec = build_chart(&make_data(), "HorizontalBar", &ChartOptions::default()).unwrap();
    assert_eq!(spec.style.index_axis.as_deref(), Some("y"));
}

#[test]
fn test_histogram_rejects_zero_bins() {
    let err = build_chart(&make_data(), "histogram", &options(json!({"bins": 0}))).unwrap_err();
    assert!(matches!(err, ChartError::InvalidOption { .. }));
}

#[test]
fn test_heatmap_needs_two_numerical_columns() {
    let err = build_chart(&make_data(), "heatmap", &ChartOptions::default()).unwrap_err();
    assert!(matches!(err, ChartError::NoValidData { .. }));
}
