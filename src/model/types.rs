use serde::Serialize;

use crate::{
    error::ServiceError,
    imaging::{InputTensor, OutputTensor},
};

/// A loaded colorization network. Implementations must be safe to share
/// across request threads; `generate` takes `&self` and never mutates weights.
pub trait Generator: Send + Sync {
    fn generate(&self, input: &InputTensor) -> Result<OutputTensor, ServiceError>;

    fn metadata(&self) -> ModelMetadata;
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelMetadata {
    pub name: String,
    pub path: Option<String>,
    pub size_bytes: u64,
    pub device: String,
    pub input_shape: Vec<usize>,
    pub output_shape: Vec<usize>,
}

/// One named weight tensor of a model artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterInfo {
    pub name: String,
    pub shape: Vec<i64>,
    pub dtype: String,
    pub numel: usize,
}
