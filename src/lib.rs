// Library exports for vizspec

pub mod classify;
pub mod coerce;
pub mod config;
pub mod data;
pub mod error;
pub mod palette;
pub mod profile;
pub mod recommend;

// Chart pipeline
pub mod family;
pub mod ir;
pub mod resolve;
pub mod transform;
pub mod scale;
pub mod style;
pub mod template;
pub mod runtime;

pub use config::EngineConfig;
pub use data::{Row, RowSet};
pub use error::{ChartError, DataError};
pub use family::ChartFamily;
pub use ir::{ChartOptions, ChartSpec};
pub use profile::Profile;
pub use recommend::{recommend, Recommendation};
pub use runtime::{build_chart, profile, Engine};
