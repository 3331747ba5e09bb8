mod invoker;
#[cfg(feature = "tch-backend")]
mod loader;
mod types;

use std::sync::Arc;

use crate::{config::AppConfig, error::ServiceError};

pub use invoker::InferenceInvoker;
#[cfg(feature = "tch-backend")]
pub use loader::TorchScriptGenerator;
pub use types::{Generator, ModelMetadata, ParameterInfo};

/// Loads the generator named by the configuration. Called once at startup;
/// a failure here is fatal.
#[cfg(feature = "tch-backend")]
pub fn load_generator(config: &AppConfig) -> Result<Arc<dyn Generator>, ServiceError> {
    let generator = TorchScriptGenerator::load(&config.model_path, config.device)?;
    Ok(Arc::new(generator))
}

#[cfg(not(feature = "tch-backend"))]
pub fn load_generator(config: &AppConfig) -> Result<Arc<dyn Generator>, ServiceError> {
    Err(ServiceError::Startup(format!(
        "cannot load {}: built without a model backend (enable `tch-backend`)",
        config.model_path.display()
    )))
}
