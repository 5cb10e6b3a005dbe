//! Built-in widget plugins
//!
//! Each widget receives a bound record or feature collection plus its
//! validated configuration and renders an HTML fragment through the theme
//! engine. Chart semantics (bin edges, units, colors) belong to the widget;
//! the binding layer only guarantees presence and shape.

mod bar_plot;
mod donut_chart;
mod info_grid;
mod interactive_map;
mod radial_gauge;

pub use bar_plot::BarPlot;
pub use donut_chart::DonutChart;
pub use info_grid::InfoGrid;
pub use interactive_map::InteractiveMap;
pub use radial_gauge::RadialGauge;
