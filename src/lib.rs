#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod geometry;
pub mod model;
pub mod scale;
pub mod scale_dump;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, ScaleConfig, ViewportConfig, load_config};
pub use model::{Dashboard, DashboardError, Widget, WidgetId, WidgetKind, load_dashboard, parse_dashboard};
pub use scale::{ScaleOutput, ScaledGeometry, Viewport, scale_dashboard, scale_in_place};
