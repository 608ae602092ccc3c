pub mod chart;
pub mod clock;
pub mod config;
pub mod error;
pub mod metrics;
pub mod month;
pub mod plot;
pub mod selector;
pub mod series;
pub mod service;

pub use chart::{write_chart, ChartData, ChartRenderer, JsonChartRenderer};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::StatsError;
pub use metrics::PeriodMetrics;
pub use month::{MonthRange, MonthWindow, YearMonth};
pub use plot::PngChartRenderer;
pub use selector::{MonthlyPoint, MonthlySelector};
pub use series::{BasicSeries, EnhancedSeries};
pub use service::StatsService;
