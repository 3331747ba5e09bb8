use std::{sync::Arc, time::Instant};

use tracing::debug;

use crate::{
    error::ServiceError,
    imaging::{InputTensor, OutputTensor},
    model::{Generator, ModelMetadata},
};

/// Shared handle to the process-wide generator. Cloning is cheap.
#[derive(Clone)]
pub struct InferenceInvoker {
    generator: Arc<dyn Generator>,
}

impl InferenceInvoker {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    pub fn metadata(&self) -> ModelMetadata {
        self.generator.metadata()
    }

    /// Runs one forward pass. Blocking; call from a blocking-capable thread.
    pub fn generate(&self, input: &InputTensor) -> Result<OutputTensor, ServiceError> {
        let start = Instant::now();
        let output = self.generator.generate(input)?;
        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "generator forward pass complete"
        );
        Ok(output)
    }
}
