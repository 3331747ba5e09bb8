//! Image handling for the colorization pipeline: decoding uploads into pixel
//! grids, mapping grids to and from model tensors, and PNG output.

mod codec;
mod normalize;

use image::{DynamicImage, GrayImage, Luma, RgbImage};

pub use codec::{decode, encode_png};
pub use normalize::{
    INPUT_SHAPE, InputTensor, MODEL_INPUT_SIZE, OUTPUT_SHAPE, OutputTensor, from_model_output,
    input_preview, to_model_input,
};

/// Decoded raster data, either single-channel or RGB, 8 bits per sample.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelGrid {
    Luma(GrayImage),
    Rgb(RgbImage),
}

impl PixelGrid {
    pub fn from_dynamic(img: DynamicImage) -> Self {
        match img {
            DynamicImage::ImageLuma8(gray) => PixelGrid::Luma(gray),
            img if !img.color().has_color() => PixelGrid::Luma(img.to_luma8()),
            img => PixelGrid::Rgb(img.to_rgb8()),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            PixelGrid::Luma(img) => img.dimensions(),
            PixelGrid::Rgb(img) => img.dimensions(),
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            PixelGrid::Luma(_) => 1,
            PixelGrid::Rgb(_) => 3,
        }
    }

    /// Single-channel luminance using ITU-R 601-2 weights.
    pub fn to_luma(&self) -> GrayImage {
        match self {
            PixelGrid::Luma(img) => img.clone(),
            PixelGrid::Rgb(img) => {
                let (width, height) = img.dimensions();
                GrayImage::from_fn(width, height, |x, y| {
                    let [r, g, b] = img.get_pixel(x, y).0;
                    let weighted =
                        u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000;
                    Luma([(weighted >> 16) as u8])
                })
            }
        }
    }

    pub fn to_rgb(&self) -> RgbImage {
        match self {
            PixelGrid::Luma(img) => DynamicImage::ImageLuma8(img.clone()).to_rgb8(),
            PixelGrid::Rgb(img) => img.clone(),
        }
    }

    pub fn into_dynamic(self) -> DynamicImage {
        match self {
            PixelGrid::Luma(img) => DynamicImage::ImageLuma8(img),
            PixelGrid::Rgb(img) => DynamicImage::ImageRgb8(img),
        }
    }
}
