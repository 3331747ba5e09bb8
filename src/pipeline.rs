//! The per-request colorization pass: decode, normalize, infer, denormalize,
//! encode. Stateless apart from the shared generator.

use axum::body::Bytes;
use image::{GenericImage, RgbImage};
use tokio::task;
use tracing::info;

use crate::{
    error::ServiceError,
    imaging::{self, InputTensor, MODEL_INPUT_SIZE, PixelGrid},
    model::InferenceInvoker,
};

/// A file part pulled out of the multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedImage {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.file_name.is_empty() {
            return Err(ServiceError::Validation("No image selected".into()));
        }
        // MIME types compare case-insensitively.
        if !self.content_type.to_ascii_lowercase().starts_with("image/") {
            return Err(ServiceError::Validation(
                "Invalid file type. Please upload an image.".into(),
            ));
        }
        Ok(())
    }
}

pub struct Colorized {
    pub input: InputTensor,
    pub output: PixelGrid,
}

impl Colorized {
    pub fn to_png(&self) -> Result<Vec<u8>, ServiceError> {
        imaging::encode_png(&self.output)
    }

    /// The resized grayscale input on the left, the generated colors on the right.
    pub fn comparison(&self) -> Result<RgbImage, ServiceError> {
        let gray = PixelGrid::Luma(imaging::input_preview(&self.input)).to_rgb();
        let color = self.output.to_rgb();

        let mut canvas = RgbImage::new(MODEL_INPUT_SIZE * 2, MODEL_INPUT_SIZE);
        canvas
            .copy_from(&gray, 0, 0)
            .and_then(|_| canvas.copy_from(&color, MODEL_INPUT_SIZE, 0))
            .map_err(|e| ServiceError::Processing(format!("failed to compose comparison: {e}")))?;
        Ok(canvas)
    }
}

pub fn colorize(invoker: &InferenceInvoker, bytes: &[u8]) -> Result<Colorized, ServiceError> {
    let grid = imaging::decode(bytes)?;
    let (width, height) = grid.dimensions();
    let input = imaging::to_model_input(&grid);
    let generated = invoker.generate(&input)?;
    let output = imaging::from_model_output(&generated);

    info!(width, height, channels = grid.channels(), "colorized upload");
    Ok(Colorized { input, output })
}

/// Validates the upload and runs the pipeline on the blocking pool, returning
/// PNG bytes.
pub async fn colorize_upload(
    invoker: InferenceInvoker,
    upload: UploadedImage,
) -> Result<Vec<u8>, ServiceError> {
    upload.validate()?;

    info!(
        file_name = %upload.file_name,
        content_type = %upload.content_type,
        bytes = upload.bytes.len(),
        "processing upload"
    );

    task::spawn_blocking(move || colorize(&invoker, &upload.bytes)?.to_png())
        .await
        .map_err(|err| ServiceError::Inference(format!("inference task failed: {err}")))?
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use image::{GrayImage, Luma};
    use ndarray::Array4;

    use super::*;
    use crate::{
        imaging::{INPUT_SHAPE, OUTPUT_SHAPE, OutputTensor},
        model::{Generator, ModelMetadata},
    };

    /// Paints the red channel with the input and leaves green and blue dark.
    struct RedTint;

    impl Generator for RedTint {
        fn generate(&self, input: &InputTensor) -> Result<OutputTensor, ServiceError> {
            let view = input.view();
            OutputTensor::new(Array4::from_shape_fn(OUTPUT_SHAPE, |(n, y, x, c)| {
                if c == 0 { view[[n, y, x, 0]] } else { -1.0 }
            }))
        }

        fn metadata(&self) -> ModelMetadata {
            ModelMetadata {
                name: "red-tint".into(),
                path: None,
                size_bytes: 0,
                device: "Cpu".into(),
                input_shape: INPUT_SHAPE.to_vec(),
                output_shape: OUTPUT_SHAPE.to_vec(),
            }
        }
    }

    fn upload(file_name: &str, content_type: &str, bytes: Vec<u8>) -> UploadedImage {
        UploadedImage {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: Bytes::from(bytes),
        }
    }

    fn white_png(width: u32, height: u32) -> Vec<u8> {
        let grid = PixelGrid::Luma(GrayImage::from_pixel(width, height, Luma([255])));
        imaging::encode_png(&grid).unwrap()
    }

    #[test]
    fn validation_rejects_missing_name_and_non_images() {
        let err = upload("", "image/png", vec![1]).validate().unwrap_err();
        assert_eq!(err.to_string(), "No image selected");

        let err = upload("notes.txt", "text/plain", vec![1]).validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid file type. Please upload an image.");

        assert!(upload("photo.jpg", "image/jpeg", vec![1]).validate().is_ok());
        assert!(upload("photo.jpg", "Image/JPEG", vec![1]).validate().is_ok());
        assert!(upload("photo.png", "IMAGE/png; charset=binary", vec![1]).validate().is_ok());
    }

    #[test]
    fn colorize_produces_model_sized_rgb() {
        let invoker = InferenceInvoker::new(Arc::new(RedTint));
        let colorized = colorize(&invoker, &white_png(300, 40)).unwrap();

        assert_eq!(colorized.output.dimensions(), (128, 128));
        let PixelGrid::Rgb(img) = &colorized.output else {
            panic!("expected RGB output");
        };
        assert!(img.pixels().all(|p| p.0 == [255, 0, 0]));

        let comparison = colorized.comparison().unwrap();
        assert_eq!(comparison.dimensions(), (256, 128));
        assert_eq!(comparison.get_pixel(10, 10).0, [255, 255, 255]);
        assert_eq!(comparison.get_pixel(200, 10).0, [255, 0, 0]);
    }

    #[tokio::test]
    async fn colorize_upload_returns_png_bytes() {
        let invoker = InferenceInvoker::new(Arc::new(RedTint));
        let png = colorize_upload(invoker, upload("white.png", "image/png", white_png(64, 64)))
            .await
            .unwrap();

        let decoded = imaging::decode(&png).unwrap();
        assert_eq!(decoded.dimensions(), (128, 128));
        assert_eq!(decoded.channels(), 3);
    }

    #[tokio::test]
    async fn undecodable_bytes_fail_before_inference() {
        let invoker = InferenceInvoker::new(Arc::new(RedTint));
        let err = colorize_upload(invoker, upload("broken.png", "image/png", b"nope".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Decode(_)));
    }
}
