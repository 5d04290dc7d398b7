// SPDX-License-Identifier: GPL-3.0-only

//! Reference frame preparation and still encoding
//!
//! Recognition and photos both work on a fixed 1280x720 reference frame so
//! detection coordinates are comparable regardless of the feed resolution.

use crate::backends::camera::CameraFrame;
use crate::constants::{JPEG_QUALITY, REFERENCE_HEIGHT, REFERENCE_WIDTH};
use crate::errors::CameraError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use tracing::debug;

/// A JPEG-encoded reference frame
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EncodedFrame {
    /// Base64 payload for recognition requests
    pub fn to_base64(&self) -> String {
        encode_base64(&self.jpeg)
    }

    /// `WxH` string for gallery metadata
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Letterbox a frame into the reference size
///
/// The frame is scaled to fit while keeping its aspect ratio; the remaining
/// area is black.
pub fn prepare_reference_frame(frame: &CameraFrame) -> Result<RgbImage, CameraError> {
    let rgba = frame.to_rgba_image().ok_or_else(|| {
        CameraError::CaptureFailed(format!(
            "frame data does not match {}x{}",
            frame.width, frame.height
        ))
    })?;
    let rgb = image::DynamicImage::ImageRgba8(rgba).to_rgb8();

    if rgb.width() == REFERENCE_WIDTH && rgb.height() == REFERENCE_HEIGHT {
        return Ok(rgb);
    }
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(CameraError::CaptureFailed("empty frame".into()));
    }

    let (width, height) = fit_within(rgb.width(), rgb.height(), REFERENCE_WIDTH, REFERENCE_HEIGHT);
    let scaled = imageops::resize(&rgb, width, height, FilterType::Triangle);

    let mut canvas = RgbImage::from_pixel(REFERENCE_WIDTH, REFERENCE_HEIGHT, Rgb([0, 0, 0]));
    let x = (REFERENCE_WIDTH - width) / 2;
    let y = (REFERENCE_HEIGHT - height) / 2;
    imageops::replace(&mut canvas, &scaled, x as i64, y as i64);

    debug!(
        src_width = frame.width,
        src_height = frame.height,
        width,
        height,
        "Letterboxed frame into reference size"
    );
    Ok(canvas)
}

/// Largest size with the source aspect ratio that fits the bounds
fn fit_within(src_w: u32, src_h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w);
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h);
    (w, h)
}

/// Encode an RGB image as JPEG
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, CameraError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);

    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| CameraError::CaptureFailed(format!("JPEG encoding failed: {e}")))?;

    Ok(buffer)
}

pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Letterbox and JPEG-encode a frame on the blocking pool
pub async fn encode_reference_frame(frame: CameraFrame) -> Result<EncodedFrame, CameraError> {
    tokio::task::spawn_blocking(move || {
        let image = prepare_reference_frame(&frame)?;
        let jpeg = encode_jpeg(&image, JPEG_QUALITY)?;
        debug!(size = jpeg.len(), "Encoded reference frame");
        Ok(EncodedFrame {
            jpeg,
            width: image.width(),
            height: image.height(),
        })
    })
    .await
    .map_err(|e| CameraError::CaptureFailed(format!("encoding task error: {e}")))?
}

/// Convert packed YUYV (4:2:2) into tightly packed RGBA
pub fn yuyv_to_rgba(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let width = width as usize;
    let height = height as usize;
    let stride = (stride as usize).max(width * 2);
    let mut out = Vec::with_capacity(width * height * 4);

    for row in 0..height {
        let start = row * stride;
        for pair in 0..width.div_ceil(2) {
            let offset = start + pair * 4;
            let Some(px) = data.get(offset..offset + 4) else {
                out.resize((row + 1) * width * 4, 0);
                break;
            };
            let (y0, u, y1, v) = (px[0], px[1], px[2], px[3]);

            let (r, g, b) = yuv_to_rgb(y0, u, v);
            out.extend_from_slice(&[r, g, b, 255]);
            if pair * 2 + 1 < width {
                let (r, g, b) = yuv_to_rgb(y1, u, v);
                out.extend_from_slice(&[r, g, b, 255]);
            }
        }
    }

    out
}

/// Convert YUV to RGB (BT.601)
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}
