//! Conversions between `image` buffers and OpenCV `Mat`s.
//!
//! OpenCV stores colour frames as BGR; everything on the Rust side is RGB.

use image::{GrayImage, RgbImage};
use opencv::core::Mat;
use opencv::imgproc;
use opencv::prelude::*;

/// Copy a BGR `Mat` into an `RgbImage`. Empty mats yield `None`.
pub fn bgr_mat_to_rgb(mat: &Mat) -> opencv::Result<Option<RgbImage>> {
    if mat.empty() {
        return Ok(None);
    }
    let mut rgb = Mat::default();
    imgproc::cvt_color_def(mat, &mut rgb, imgproc::COLOR_BGR2RGB)?;

    let width = rgb.cols() as u32;
    let height = rgb.rows() as u32;
    let data = rgb.data_bytes()?.to_vec();
    Ok(RgbImage::from_raw(width, height, data))
}

/// Copy an `RgbImage` into a freshly allocated BGR `Mat`.
pub fn rgb_to_bgr_mat(image: &RgbImage) -> opencv::Result<Mat> {
    let (width, height) = image.dimensions();
    let flat = Mat::new_rows_cols_with_data(
        height as i32,
        (width * 3) as i32,
        image.as_raw().as_slice(),
    )?;
    let rgb = flat.reshape(3, height as i32)?;
    let mut bgr = Mat::default();
    imgproc::cvt_color_def(&*rgb, &mut bgr, imgproc::COLOR_RGB2BGR)?;
    Ok(bgr)
}

/// Copy a `GrayImage` into an owned single-channel `Mat`.
pub fn gray_to_mat(image: &GrayImage) -> opencv::Result<Mat> {
    let (width, height) = image.dimensions();
    let borrowed =
        Mat::new_rows_cols_with_data(height as i32, width as i32, image.as_raw().as_slice())?;
    borrowed.try_clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn test_rgb_bgr_roundtrip_keeps_channel_order() {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(0, 0, Rgb([255, 0, 0]));
        image.put_pixel(1, 0, Rgb([0, 0, 255]));

        let bgr = rgb_to_bgr_mat(&image).unwrap();
        assert_eq!((bgr.cols(), bgr.rows(), bgr.channels()), (2, 1, 3));
        // OpenCV order: red is stored in the last channel.
        assert_eq!(bgr.data_bytes().unwrap(), &[0, 0, 255, 255, 0, 0]);

        let back = bgr_mat_to_rgb(&bgr).unwrap().unwrap();
        assert_eq!(back, image);
    }

    #[test]
    fn test_empty_mat_is_none() {
        assert!(bgr_mat_to_rgb(&Mat::default()).unwrap().is_none());
    }

    #[test]
    fn test_gray_to_mat_copies_pixels() {
        let gray = GrayImage::from_fn(3, 2, |x, y| Luma([(y * 3 + x) as u8]));
        let mat = gray_to_mat(&gray).unwrap();
        assert_eq!((mat.cols(), mat.rows(), mat.channels()), (3, 2, 1));
        assert_eq!(mat.data_bytes().unwrap(), gray.as_raw().as_slice());
    }
}
