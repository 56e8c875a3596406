//! Projection engine for the operational efficiency calculator.
//!
//! Four user assumptions go in ([`MetricsInput`]); two panels come out, one
//! per [`Scenario`]. Everything here is pure and synchronous.

pub mod coerce;
pub mod controller;
pub mod currency;
pub mod metrics;
pub mod scenario;

pub use coerce::coerce_number;
pub use controller::{MetricsController, RenderCallback};
pub use currency::format_brl;
pub use metrics::{MetricsField, MetricsInput};
pub use scenario::{project, Comparison, Scenario, ScenarioFigures, ScenarioResult};
