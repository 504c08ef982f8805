//! Backends for the home-services marketplace: the multilingual help
//! assistant and the provider dashboard's data service.

pub mod assistant;
pub mod config;
pub mod error;
pub mod language;
pub mod llm;
pub mod marketplace;
pub mod routes;
pub mod state;
pub mod store;
pub mod telemetry;
#[doc(hidden)]
pub mod testing;
pub mod translate;
pub mod upload;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use language::Language;
