//! Affine mapping between 8-bit pixels and the generator's `[-1, 1]` range.
//!
//! Tensors use NHWC layout: the input is `(1, 128, 128, 1)` grayscale and the
//! output is `(1, 128, 128, 3)` RGB.

use image::{GrayImage, Luma, Rgb, RgbImage, imageops::FilterType};
use ndarray::{Array4, ArrayView4};

use super::PixelGrid;
use crate::error::ServiceError;

/// Side length of the square images the generator was trained on.
pub const MODEL_INPUT_SIZE: u32 = 128;

const SIDE: usize = MODEL_INPUT_SIZE as usize;

pub const INPUT_SHAPE: [usize; 4] = [1, SIDE, SIDE, 1];
pub const OUTPUT_SHAPE: [usize; 4] = [1, SIDE, SIDE, 3];

/// Batched grayscale tensor handed to the generator.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor(Array4<f32>);

impl InputTensor {
    pub fn new(data: Array4<f32>) -> Result<Self, ServiceError> {
        check_shape("input", data.shape(), &INPUT_SHAPE)?;
        Ok(Self(data))
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.0.view()
    }

    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    /// Values in row-major NHWC order.
    pub fn to_vec(&self) -> Vec<f32> {
        self.0.iter().copied().collect()
    }
}

/// Raw generator output. Values are nominally in `[-1, 1]` but unbounded.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTensor(Array4<f32>);

impl OutputTensor {
    pub fn new(data: Array4<f32>) -> Result<Self, ServiceError> {
        check_shape("output", data.shape(), &OUTPUT_SHAPE)?;
        Ok(Self(data))
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.0.view()
    }

    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }
}

fn check_shape(kind: &str, actual: &[usize], expected: &[usize]) -> Result<(), ServiceError> {
    if actual != expected {
        return Err(ServiceError::Inference(format!(
            "{kind} tensor shape mismatch: expected {expected:?}, got {actual:?}"
        )));
    }
    Ok(())
}

/// Grayscale, Lanczos-resize to 128x128, then map `[0, 255]` onto `[-1, 1]`.
pub fn to_model_input(grid: &PixelGrid) -> InputTensor {
    let luma = grid.to_luma();
    let resized = if luma.dimensions() == (MODEL_INPUT_SIZE, MODEL_INPUT_SIZE) {
        luma
    } else {
        image::imageops::resize(&luma, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, FilterType::Lanczos3)
    };

    let data = Array4::from_shape_fn(INPUT_SHAPE, |(_, y, x, _)| {
        f32::from(resized.get_pixel(x as u32, y as u32)[0]) / 127.5 - 1.0
    });
    InputTensor(data)
}

/// Inverse of [`to_model_input`]'s value mapping, for previewing what the
/// generator actually saw.
pub fn input_preview(input: &InputTensor) -> GrayImage {
    let view = input.view();
    GrayImage::from_fn(MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, |x, y| {
        Luma([to_sample(view[[0, y as usize, x as usize, 0]])])
    })
}

/// Rescale to `[0, 1]`, clip, and truncate to 8-bit RGB.
pub fn from_model_output(output: &OutputTensor) -> PixelGrid {
    let view = output.view();
    let img = RgbImage::from_fn(MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, |x, y| {
        let (x, y) = (x as usize, y as usize);
        Rgb([
            to_sample(view[[0, y, x, 0]]),
            to_sample(view[[0, y, x, 1]]),
            to_sample(view[[0, y, x, 2]]),
        ])
    });
    PixelGrid::Rgb(img)
}

fn to_sample(value: f32) -> u8 {
    let unit = ((value + 1.0) / 2.0).clamp(0.0, 1.0);
    // NaN survives clamp; the saturating cast turns it into 0.
    (unit * 255.0) as u8
}
