use std::{fs, path::Path};

use ndarray::Array4;
use parking_lot::Mutex;
use tch::{Device, IValue, Kind, Tensor, no_grad};

use crate::{
    error::ServiceError,
    imaging::{INPUT_SHAPE, InputTensor, OUTPUT_SHAPE, OutputTensor},
    model::{Generator, ModelMetadata, ParameterInfo},
};

/// A traced TorchScript generator taking NHWC `(1, 128, 128, 1)` input.
pub struct TorchScriptGenerator {
    metadata: ModelMetadata,
    device: Device,
    module: Mutex<tch::CModule>,
}

impl TorchScriptGenerator {
    pub fn load(module_path: &Path, device: Device) -> Result<Self, ServiceError> {
        if !module_path.exists() {
            return Err(ServiceError::Startup(format!(
                "model artifact missing: {}",
                module_path.display()
            )));
        }
        let size_bytes = fs::metadata(module_path)?.len();
        let mut module = tch::CModule::load_on_device(module_path, device)
            .map_err(|e| ServiceError::Startup(e.to_string()))?;
        module.set_eval();

        let name = module_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "generator".to_string());

        Ok(Self {
            metadata: ModelMetadata {
                name,
                path: Some(module_path.display().to_string()),
                size_bytes,
                device: format!("{device:?}"),
                input_shape: INPUT_SHAPE.to_vec(),
                output_shape: OUTPUT_SHAPE.to_vec(),
            },
            device,
            module: Mutex::new(module),
        })
    }

    pub fn parameters(&self) -> Result<Vec<ParameterInfo>, ServiceError> {
        let named = self
            .module
            .lock()
            .named_parameters()
            .map_err(|e| ServiceError::Processing(e.to_string()))?;

        Ok(named
            .into_iter()
            .map(|(name, tensor)| ParameterInfo {
                name,
                shape: tensor.size(),
                dtype: format!("{:?}", tensor.kind()),
                numel: tensor.numel(),
            })
            .collect())
    }
}

impl Generator for TorchScriptGenerator {
    fn generate(&self, input: &InputTensor) -> Result<OutputTensor, ServiceError> {
        let dims: Vec<i64> = INPUT_SHAPE.iter().map(|&d| d as i64).collect();
        let values = input.to_vec();
        let input_tensor = Tensor::from_slice(values.as_slice())
            .reshape(dims.as_slice())
            .to(self.device);

        let output = no_grad(|| {
            let module = self.module.lock();
            module
                .forward_is(&[IValue::Tensor(input_tensor)])
                .map_err(|e| ServiceError::Inference(e.to_string()))
        })?;

        // Keras-exported graphs return the image directly; some wrappers return a tuple.
        let generated = match output {
            IValue::Tensor(t) => t,
            IValue::Tuple(ref tuple) if !tuple.is_empty() => match &tuple[0] {
                IValue::Tensor(t) => t.shallow_clone(),
                _ => {
                    return Err(ServiceError::Inference(
                        "expected tensor as first tuple element".into(),
                    ));
                }
            },
            _ => {
                return Err(ServiceError::Inference(
                    "unexpected model output format".into(),
                ));
            }
        };

        tensor_to_output(&generated)
    }

    fn metadata(&self) -> ModelMetadata {
        self.metadata.clone()
    }
}

fn tensor_to_output(tensor: &Tensor) -> Result<OutputTensor, ServiceError> {
    let side = OUTPUT_SHAPE[1] as i64;
    let nhwc = match tensor.size().as_slice() {
        [1, h, w, 3] if *h == side && *w == side => tensor.shallow_clone(),
        // channels-first export
        [1, 3, h, w] if *h == side && *w == side => tensor.permute([0, 2, 3, 1]),
        other => {
            return Err(ServiceError::Inference(format!(
                "generator returned shape {other:?}, expected {OUTPUT_SHAPE:?}"
            )));
        }
    };

    let flat = nhwc
        .to_device(Device::Cpu)
        .to_kind(Kind::Float)
        .contiguous()
        .view([-1]);
    let values = Vec::<f32>::try_from(&flat)
        .map_err(|e| ServiceError::Inference(format!("failed to read generator output: {e}")))?;
    let array = Array4::from_shape_vec(OUTPUT_SHAPE, values)
        .map_err(|e| ServiceError::Inference(e.to_string()))?;

    OutputTensor::new(array)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_artifact_is_a_startup_error() {
        let err = TorchScriptGenerator::load(Path::new("does/not/exist.pt"), Device::Cpu)
            .err()
            .unwrap();
        assert!(matches!(err, ServiceError::Startup(_)));
        assert!(err.to_string().contains("does/not/exist.pt"));
    }

    #[test]
    fn channels_first_output_is_permuted() {
        let nchw =
            Tensor::arange(3 * 128 * 128, (Kind::Float, Device::Cpu)).reshape([1, 3, 128, 128]);
        let output = tensor_to_output(&nchw).unwrap();
        let view = output.view();
        assert_eq!(view[[0, 0, 0, 0]], 0.0);
        assert_eq!(view[[0, 0, 0, 1]], (128 * 128) as f32);
        assert_eq!(view[[0, 0, 1, 2]], (2 * 128 * 128 + 1) as f32);
    }

    #[test]
    fn unexpected_output_shape_is_an_inference_error() {
        let wrong = Tensor::zeros([1, 64, 64, 3], (Kind::Float, Device::Cpu));
        assert!(matches!(
            tensor_to_output(&wrong),
            Err(ServiceError::Inference(_))
        ));
    }
}
