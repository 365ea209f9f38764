pub mod api;
pub mod config;
pub mod error;
pub mod form;
pub mod loader;
pub mod schema;
mod session;
pub mod state;
pub mod views;

pub use api::ModelApi;
pub use config::DashboardConfig;
pub use error::{DashboardError, Result};
pub use form::{build_form, FeatureForm, FeatureFormEntry, FormValue, PredictionRequest};
pub use loader::{FetchOutcome, MetadataReport};
pub use schema::{FeatureSchema, FeatureSpec};
pub use session::{Session, ViewScope};
pub use state::DashboardState;
pub use views::{HyperParameters, ModelInfo, ModelSummary, Prediction, TrainResults};
