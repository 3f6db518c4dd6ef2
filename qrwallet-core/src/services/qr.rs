//! QR decoding for camera frames and uploaded images

use image::{GrayImage, ImageBuffer, Rgba};

use crate::domain::result::{Error, Result};
use crate::domain::Frame;

/// Decode the first QR payload in an RGBA frame
pub fn decode_frame(frame: &Frame) -> Option<String> {
    if !frame.is_well_formed() {
        return None;
    }
    let rgba: ImageBuffer<Rgba<u8>, &[u8]> =
        ImageBuffer::from_raw(frame.width, frame.height, frame.pixels.as_slice())?;
    decode_luma(&image::imageops::grayscale(&rgba))
}

/// Decode the first QR payload in an encoded image (PNG, JPEG)
///
/// `Ok(None)` means the image was read but holds no readable code.
pub fn decode_image_bytes(bytes: &[u8]) -> Result<Option<String>> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| Error::DecodeFailure(format!("unreadable image: {}", e)))?;
    Ok(decode_luma(&img.to_luma8()))
}

/// Run the detector over a greyscale image
pub fn decode_luma(image: &GrayImage) -> Option<String> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
            image.get_pixel(x as u32, y as u32).0[0]
        });

    prepared
        .detect_grids()
        .into_iter()
        .find_map(|grid| grid.decode().ok().map(|(_meta, content)| content))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use image::{GrayImage, Luma};
    use qrcode::{Color, QrCode};

    /// Render `payload` as a greyscale QR image with a quiet zone
    pub fn qr_image(payload: &str) -> GrayImage {
        let code = QrCode::new(payload.as_bytes()).expect("payload fits in a QR code");
        let modules = code.width() as u32;
        let colors = code.to_colors();
        let (scale, quiet) = (8u32, 4u32);
        let side = (modules + quiet * 2) * scale;

        GrayImage::from_fn(side, side, |x, y| {
            let (mx, my) = (x / scale, y / scale);
            let inside = mx >= quiet && my >= quiet && mx < modules + quiet && my < modules + quiet;
            if inside {
                let idx = ((my - quiet) * modules + (mx - quiet)) as usize;
                if colors[idx] == Color::Dark {
                    return Luma([0]);
                }
            }
            Luma([255])
        })
    }

    pub fn png_bytes(image: &GrayImage) -> Vec<u8> {
        let mut bytes = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, image::ImageFormat::Png)
            .expect("png encoding");
        bytes.into_inner()
    }
}
