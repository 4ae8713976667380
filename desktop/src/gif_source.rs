//! Animated GIF to panel-sized, inverted grayscale frames.

use std::io::Cursor;

use image::{
    AnimationDecoder, DynamicImage, GrayImage, ImageError, Luma, codecs::gif::GifDecoder, imageops,
};
use log::{debug, warn};
use planedelta_core::{
    geometry::{HEIGHT, WIDTH},
    quantize::{FrameError, GrayscaleFrame},
};

#[derive(Debug)]
pub enum SourceError {
    Image(ImageError),
    Frame(FrameError),
    NoFrames,
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Image(error) => write!(f, "cannot decode image: {error}"),
            SourceError::Frame(error) => write!(f, "{error}"),
            SourceError::NoFrames => write!(f, "image has no frames"),
        }
    }
}

impl std::error::Error for SourceError {}

impl From<ImageError> for SourceError {
    fn from(error: ImageError) -> Self {
        SourceError::Image(error)
    }
}

impl From<FrameError> for SourceError {
    fn from(error: FrameError) -> Self {
        SourceError::Frame(error)
    }
}

pub struct SourceFrame {
    pub frame: GrayscaleFrame,
    pub delay_ms: u32,
}

/// Decode every frame of a GIF. Frames without a delay get `default_delay_ms`.
pub fn decode_gif(data: &[u8], default_delay_ms: u32) -> Result<Vec<SourceFrame>, SourceError> {
    let decoder = GifDecoder::new(Cursor::new(data))?;
    let frames = decoder.into_frames().collect_frames()?;
    if frames.is_empty() {
        return Err(SourceError::NoFrames);
    }

    let mut out = Vec::with_capacity(frames.len());
    for (index, frame) in frames.into_iter().enumerate() {
        let (numer, denom) = frame.delay().numer_denom_ms();
        let mut delay_ms = if denom == 0 { 0 } else { numer / denom };
        if delay_ms == 0 {
            warn!("frame {index} has no delay, using {default_delay_ms} ms");
            delay_ms = default_delay_ms;
        }
        let image = DynamicImage::ImageRgba8(frame.into_buffer());
        debug!("frame {index}: {}x{}, {delay_ms} ms", image.width(), image.height());
        out.push(SourceFrame {
            frame: to_frame(&image)?,
            delay_ms,
        });
    }
    Ok(out)
}

/// Luma with transparency resolved against white.
fn flatten(image: &DynamicImage) -> GrayImage {
    let luma_alpha = image.to_luma_alpha8();
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [luma, alpha] = luma_alpha.get_pixel(x, y).0;
        let (luma, alpha) = (luma as u32, alpha as u32);
        Luma([((luma * alpha + 255 * (255 - alpha)) / 255) as u8])
    })
}

/// Size that fits `width x height` inside the panel keeping the aspect ratio. Never enlarges.
pub fn fit_size(width: u32, height: u32) -> (u32, u32) {
    let (max_w, max_h) = (WIDTH as u32, HEIGHT as u32);
    if width <= max_w && height <= max_h {
        return (width, height);
    }
    // Compare max_w / width against max_h / height without floats.
    if max_w as u64 * height as u64 <= max_h as u64 * width as u64 {
        let h = ((height as u64 * max_w as u64 + width as u64 / 2) / width as u64).max(1);
        (max_w, h as u32)
    } else {
        let w = ((width as u64 * max_h as u64 + height as u64 / 2) / height as u64).max(1);
        (w as u32, max_h)
    }
}

/// Shrink, centre on a white panel-sized canvas and invert so that white becomes 0.
pub fn to_frame(image: &DynamicImage) -> Result<GrayscaleFrame, FrameError> {
    let gray = flatten(image);
    let (w, h) = fit_size(gray.width(), gray.height());
    let scaled = if (w, h) == gray.dimensions() {
        gray
    } else {
        imageops::thumbnail(&gray, w, h)
    };

    let mut canvas = GrayImage::from_pixel(WIDTH as u32, HEIGHT as u32, Luma([255]));
    let x = (WIDTH as i64 - w as i64) / 2;
    let y = (HEIGHT as i64 - h as i64) / 2;
    imageops::overlay(&mut canvas, &scaled, x, y);
    imageops::invert(&mut canvas);

    GrayscaleFrame::new(canvas.into_raw())
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;

    #[test]
    fn test_fit_size() {
        assert_eq!(fit_size(100, 50), (100, 50));
        assert_eq!(fit_size(192, 63), (192, 63));
        assert_eq!(fit_size(384, 126), (192, 63));
        assert_eq!(fit_size(400, 100), (192, 48));
        assert_eq!(fit_size(100, 200), (32, 63));
        assert_eq!(fit_size(10000, 1), (192, 1));
    }

    #[test]
    fn test_white_becomes_zero() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(50, 20, Rgba([255; 4])));
        let frame = to_frame(&image).unwrap();
        assert!(frame.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_black_is_centred() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255])));
        let frame = to_frame(&image).unwrap();
        let dark: Vec<usize> = frame
            .pixels()
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p == 255)
            .map(|(i, _)| i)
            .collect();
        // x = (192 - 2) / 2 = 95, y = (63 - 1) / 2 = 31.
        assert_eq!(dark, [31 * WIDTH + 95, 31 * WIDTH + 96]);
    }

    #[test]
    fn test_transparent_is_white() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0])));
        let frame = to_frame(&image).unwrap();
        assert!(frame.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_large_image_fills_panel() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            WIDTH as u32 * 2,
            HEIGHT as u32 * 2,
            Rgba([0, 0, 0, 255]),
        ));
        let frame = to_frame(&image).unwrap();
        assert!(frame.pixels().iter().all(|&p| p == 255));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(decode_gif(b"not a gif", 100), Err(SourceError::Image(_))));
    }
}
