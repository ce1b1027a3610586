#![doc = "Geographically-weighted regression and spatial autocorrelation for SuAVE surveys"]
pub mod assemble;
pub mod config;
pub mod derive;
pub mod error;
pub mod geometry;
pub mod gwr;
pub mod moran;
pub mod pipeline;
pub mod render;
pub mod session;
pub mod table;
pub mod weights;

#[cfg(feature = "network")]
pub mod publish;
#[cfg(feature = "network")]
pub mod survey;

#[doc(inline)]
pub use config::{GwrConfig, MoranConfig, PipelineConfig};

#[doc(inline)]
pub use error::{Error, ErrorClass, Result, Stage};

#[doc(inline)]
pub use geometry::{GeoTable, Shape};

#[doc(inline)]
pub use gwr::{FittedModel, GwrData, RegressionSpec};

#[doc(inline)]
pub use moran::MoranStatistics;

#[doc(inline)]
pub use pipeline::{run, run_table, RunMetadata, RunOutcome};

#[doc(inline)]
pub use session::{Session, SessionStore};

#[doc(inline)]
pub use table::FeatureTable;
