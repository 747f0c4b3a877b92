//! Raw camera buffer conversion: YUYV, GREY and MJPG to RGB.

use image::RgbImage;

/// Convert packed YUYV (4:2:2) to RGB using limited-range BT.601
/// coefficients (luma 16..=235), which is what UVC webcams send.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V]; both pixels share
/// the chroma pair.
pub fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Result<RgbImage, FrameError> {
    let expected = (width * height * 2) as usize;
    if yuyv.len() < expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: yuyv.len(),
        });
    }

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for chunk in yuyv[..expected].chunks_exact(4) {
        let u = chunk[1] as f32 - 128.0;
        let v = chunk[3] as f32 - 128.0;
        for y in [chunk[0], chunk[2]] {
            rgb.extend_from_slice(&yuv_to_rgb(y as f32, u, v));
        }
    }

    RgbImage::from_raw(width, height, rgb).ok_or(FrameError::Dimensions { width, height })
}

fn yuv_to_rgb(y: f32, u: f32, v: f32) -> [u8; 3] {
    let y = 1.164 * (y - 16.0);
    let r = y + 1.596 * v;
    let g = y - 0.392 * u - 0.813 * v;
    let b = y + 2.017 * u;
    [
        r.round().clamp(0.0, 255.0) as u8,
        g.round().clamp(0.0, 255.0) as u8,
        b.round().clamp(0.0, 255.0) as u8,
    ]
}

/// Expand 8-bit grayscale to RGB by replicating the channel.
pub fn grey_to_rgb(grey: &[u8], width: u32, height: u32) -> Result<RgbImage, FrameError> {
    let expected = (width * height) as usize;
    if grey.len() < expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: grey.len(),
        });
    }
    let rgb = grey[..expected].iter().flat_map(|&p| [p, p, p]).collect();
    RgbImage::from_raw(width, height, rgb).ok_or(FrameError::Dimensions { width, height })
}

/// Decode one Motion-JPEG buffer.
pub fn mjpg_to_rgb(jpeg: &[u8]) -> Result<RgbImage, FrameError> {
    if jpeg.is_empty() {
        return Err(FrameError::InvalidLength {
            expected: 1,
            actual: 0,
        });
    }
    let decoded = image::load_from_memory_with_format(jpeg, image::ImageFormat::Jpeg)?;
    Ok(decoded.to_rgb8())
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid buffer length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("bad frame dimensions {width}x{height}")]
    Dimensions { width: u32, height: u32 },
    #[error("jpeg: {0}")]
    Jpeg(#[from] image::ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_yuyv_to_rgb_neutral_chroma() {
        // 2x1 image: [Y0=100, U=128, Y1=200, V=128] is pure gray.
        let yuyv = vec![100, 128, 200, 128];
        let rgb = yuyv_to_rgb(&yuyv, 2, 1).unwrap();
        assert_eq!(*rgb.get_pixel(0, 0), Rgb([98, 98, 98]));
        assert_eq!(*rgb.get_pixel(1, 0), Rgb([214, 214, 214]));
    }

    #[test]
    fn test_yuyv_limited_range_endpoints() {
        let rgb = yuyv_to_rgb(&[16, 128, 235, 128], 2, 1).unwrap();
        assert_eq!(*rgb.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*rgb.get_pixel(1, 0), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_yuyv_to_rgb_red_dominant() {
        let yuyv = vec![76, 85, 76, 255];
        let rgb = yuyv_to_rgb(&yuyv, 2, 1).unwrap();
        let Rgb([r, g, b]) = *rgb.get_pixel(0, 0);
        assert!(r > 240 && g < 20 && b < 20, "got {r},{g},{b}");
    }

    #[test]
    fn test_yuyv_to_rgb_4x2() {
        let yuyv: Vec<u8> = (0..16).map(|i| if i % 2 == 0 { 50 } else { 128 }).collect();
        let rgb = yuyv_to_rgb(&yuyv, 4, 2).unwrap();
        assert_eq!(rgb.dimensions(), (4, 2));
        assert!(rgb.pixels().all(|p| *p == Rgb([40, 40, 40])));
    }

    #[test]
    fn test_yuyv_invalid_length() {
        let yuyv = vec![100, 128]; // too short for 2x1
        assert!(yuyv_to_rgb(&yuyv, 2, 1).is_err());
    }

    #[test]
    fn test_grey_to_rgb() {
        let rgb = grey_to_rgb(&[0, 7, 255, 9], 2, 2).unwrap();
        assert_eq!(*rgb.get_pixel(1, 0), Rgb([7, 7, 7]));
        assert_eq!(*rgb.get_pixel(0, 1), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_grey_invalid_length() {
        assert!(grey_to_rgb(&[1, 2, 3], 2, 2).is_err());
    }

    #[test]
    fn test_mjpg_roundtrip_dimensions() {
        let src = RgbImage::from_pixel(8, 6, Rgb([10, 200, 30]));
        let mut jpeg = Vec::new();
        src.write_to(&mut std::io::Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .unwrap();
        let rgb = mjpg_to_rgb(&jpeg).unwrap();
        assert_eq!(rgb.dimensions(), (8, 6));
    }

    #[test]
    fn test_mjpg_garbage_is_error() {
        assert!(mjpg_to_rgb(&[0xde, 0xad, 0xbe, 0xef]).is_err());
        assert!(mjpg_to_rgb(&[]).is_err());
    }
}
