pub mod analysis;
pub mod calibration;
pub mod config;
pub mod error;
pub mod geometry;
pub mod pose;
pub mod result;
pub mod selection;
pub mod table;

pub use analysis::{AnalysisConfig, DeliveryAnalyzer};
pub use error::{AnalysisError, SelectionError, TableError};
pub use result::BiomechResult;

/// `RUST_LOG` が無ければ info で stderr に出す
pub fn init_logging() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
