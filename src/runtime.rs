// Runtime executor: profile rows and build chart specifications

use crate::classify::{classifier_from_config, ColumnTypeClassifier};
use crate::config::EngineConfig;
use crate::data::RowSet;
use crate::error::Result;
use crate::family::{lookup, ChartFamily};
use crate::ir::{ChartOptions, ChartSpec};
use crate::profile::{profile_rows, Profile};
use crate::resolve::{resolve_bindings, ColumnPartition};
use crate::scale::build_scales;
use crate::style::{apply_colors, resolve_style};
use crate::transform::{apply_transformations, TransformContext};
use std::fmt;
use tracing::debug;

/// Profiler and chart builder sharing one config and one column classifier.
///
/// Holds no per-call state; a single engine can serve concurrent callers.
pub struct Engine {
    config: EngineConfig,
    classifier: Box<dyn ColumnTypeClassifier>,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let classifier = classifier_from_config(&config);
        Self { config, classifier }
    }

    /// Inject a custom classifier.
    pub fn with_classifier(config: EngineConfig, classifier: Box<dyn ColumnTypeClassifier>) -> Self {
        Self { config, classifier }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn profile(&self, rows: &RowSet) -> Profile {
        profile_rows(rows, self.classifier.as_ref(), self.config.max_categories)
    }

    /// Build a chart, inferring column types from `rows`.
    pub fn build_chart(
        &self,
        rows: &RowSet,
        family: ChartFamily,
        options: &ChartOptions,
    ) -> Result<ChartSpec> {
        let partition = ColumnPartition::infer(rows, self.classifier.as_ref());
        self.build(rows, family, options, &partition)
    }

    /// Build a chart from a family name; unknown names are rejected.
    pub fn build_chart_named(
        &self,
        rows: &RowSet,
        family: &str,
        options: &ChartOptions,
    ) -> Result<ChartSpec> {
        self.build_chart(rows, family.parse()?, options)
    }

    /// Build a chart reusing column types from an earlier profile.
    pub fn build_chart_with_profile(
        &self,
        rows: &RowSet,
        family: ChartFamily,
        options: &ChartOptions,
        profile: &Profile,
    ) -> Result<ChartSpec> {
        let partition = ColumnPartition::from_profile(profile);
        self.build(rows, family, options, &partition)
    }

    fn build(
        &self,
        rows: &RowSet,
        family: ChartFamily,
        options: &ChartOptions,
        partition: &ColumnPartition,
    ) -> Result<ChartSpec> {
        let entry = lookup(family);

        // 1. Resolve bindings
        let bindings = resolve_bindings(entry, options, partition, rows, self.config.strict_bindings)?;

        // 2. Filter and aggregate
        let ctx = TransformContext {
            entry,
            bindings: &bindings,
            options,
            config: &self.config,
            partition,
        };
        let mut series_data = apply_transformations(rows, &ctx)?;

        // 3. Style, then colours from the resolved palette
        let style = resolve_style(entry, &bindings, options, &series_data);
        apply_colors(&mut series_data, &style.palette, entry.traits.per_item_colors);

        // 4. Scales
        let scales = build_scales(&series_data, entry, &style, &bindings);

        debug!(family = %family, scales = scales.len(), "built chart");
        Ok(ChartSpec {
            family,
            bindings,
            series_data,
            scales,
            style,
        })
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("classifier", &self.classifier.name())
            .finish()
    }
}

/// Profile with default settings.
pub fn profile(rows: &RowSet) -> Profile {
    Engine::new().profile(rows)
}

/// Build a chart with default settings.
pub fn build_chart(rows: &RowSet, family: &str, options: &ChartOptions) -> Result<ChartSpec> {
    Engine::new().build_chart_named(rows, family, options)
}
