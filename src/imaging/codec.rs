use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use super::PixelGrid;
use crate::error::ServiceError;

/// Decodes an uploaded byte stream, sniffing the format from its contents.
pub fn decode(bytes: &[u8]) -> Result<PixelGrid, ServiceError> {
    if bytes.is_empty() {
        return Err(ServiceError::Decode("uploaded file is empty".into()));
    }

    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ServiceError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| ServiceError::Decode(e.to_string()))?;

    Ok(PixelGrid::from_dynamic(img))
}

pub fn encode_png(grid: &PixelGrid) -> Result<Vec<u8>, ServiceError> {
    let mut buf = Cursor::new(Vec::new());
    grid.clone()
        .into_dynamic()
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| ServiceError::Processing(format!("failed to encode PNG: {e}")))?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn png_roundtrip_is_lossless() {
        let rgb = RgbImage::from_fn(17, 9, |x, y| Rgb([(x * 15) as u8, (y * 28) as u8, 200]));
        let grid = PixelGrid::Rgb(rgb);
        let decoded = decode(&encode_png(&grid).unwrap()).unwrap();
        assert_eq!(decoded, grid);

        let gray = PixelGrid::Luma(GrayImage::from_fn(5, 31, |x, y| Luma([(x + y * 8) as u8])));
        let decoded = decode(&encode_png(&gray).unwrap()).unwrap();
        assert_eq!(decoded, gray);
    }

    #[test]
    fn rejects_bytes_that_are_not_an_image() {
        assert!(matches!(decode(b""), Err(ServiceError::Decode(_))));
        assert!(matches!(
            decode(b"plain text pretending to be a picture"),
            Err(ServiceError::Decode(_))
        ));
    }

    #[test]
    fn rejects_truncated_png() {
        let grid = PixelGrid::Luma(GrayImage::new(32, 32));
        let png = encode_png(&grid).unwrap();
        let err = decode(&png[..png.len() / 2]).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
