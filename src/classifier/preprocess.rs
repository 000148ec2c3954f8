//! Image -> NCHW tensor

use image::imageops::FilterType;
use ndarray::Array4;

use super::ClassifierError;

// ImageNet normalization constants
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decode an uploaded image and build a `1x3xSxS` normalized tensor.
///
/// The image is stretched to `size`x`size`, the same resize the model saw
/// at export time.
pub fn image_to_tensor(bytes: &[u8], size: u32) -> Result<Array4<f32>, ClassifierError> {
    if bytes.is_empty() {
        return Err(ClassifierError::InvalidImage("empty upload".to_string()));
    }

    let img = image::load_from_memory(bytes)
        .map_err(|e| ClassifierError::InvalidImage(e.to_string()))?;

    let rgb = img.resize_exact(size, size, FilterType::Triangle).to_rgb8();

    let side = size as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, side, side));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            tensor[[0, c, y, x]] = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
        }
    }

    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_tensor_shape_is_nchw() {
        let tensor = image_to_tensor(&png(640, 480, [128, 64, 32]), 224).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_normalization() {
        let tensor = image_to_tensor(&png(8, 8, [255, 0, 0]), 4).unwrap();
        let red = (1.0 - MEAN[0]) / STD[0];
        let green = (0.0 - MEAN[1]) / STD[1];
        assert!((tensor[[0, 0, 2, 2]] - red).abs() < 1e-4);
        assert!((tensor[[0, 1, 2, 2]] - green).abs() < 1e-4);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            image_to_tensor(b"definitely not a jpeg", 224),
            Err(ClassifierError::InvalidImage(_))
        ));
        assert!(matches!(
            image_to_tensor(&[], 224),
            Err(ClassifierError::InvalidImage(_))
        ));
    }
}
