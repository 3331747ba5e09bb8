pub mod config;
pub mod error;
pub mod imaging;
pub mod model;
pub mod pipeline;
pub mod server;
pub mod telemetry;

pub use config::AppConfig;
pub use error::ServiceError;
pub use model::{Generator, InferenceInvoker, ModelMetadata, load_generator};
pub use server::build_router;
