use image::{ImageBuffer, Luma};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};

use crate::services::images;

/// Pixels per QR module in PNG output
const MODULE_SIZE: u32 = 4;

/// Light modules around the symbol, in modules
const QUIET_ZONE: u32 = 2;

#[derive(thiserror::Error, Debug)]
pub enum QrGenerationError {
    #[error("QR code generation failed: {0}")]
    QrCodeError(#[from] qrcode::types::QrError),

    #[error("PNG encoding failed: {0}")]
    ImageError(#[from] image::ImageError),
}

/// Public page where anyone can check a card
pub fn verification_url(base_url: &str, code: &str) -> String {
    format!(
        "{}/carteira/verificar/{}",
        base_url.trim_end_matches('/'),
        code
    )
}

fn encode(data: &str) -> Result<QrCode, QrGenerationError> {
    Ok(QrCode::with_error_correction_level(data.as_bytes(), EcLevel::L)?)
}

/// Generates a QR code SVG for `data`
pub fn generate_qr_svg(data: &str) -> Result<String, QrGenerationError> {
    let code = encode(data)?;

    let svg = code
        .render::<svg::Color>()
        .quiet_zone(true)
        .min_dimensions(200, 200)
        .build();

    Ok(svg)
}

/// Generates a QR code PNG for `data`
pub fn generate_qr_png(data: &str) -> Result<Vec<u8>, QrGenerationError> {
    let code = encode(data)?;

    let width = code.width() as u32;
    let img_size = (width + 2 * QUIET_ZONE) * MODULE_SIZE;

    let mut img = ImageBuffer::<Luma<u8>, Vec<u8>>::new(img_size, img_size);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let module_x = (x / MODULE_SIZE) as i64 - QUIET_ZONE as i64;
        let module_y = (y / MODULE_SIZE) as i64 - QUIET_ZONE as i64;

        let in_symbol = (0..width as i64).contains(&module_x) && (0..width as i64).contains(&module_y);
        let dark = in_symbol
            && code[(module_x as usize, module_y as usize)] == qrcode::types::Color::Dark;

        *pixel = if dark { Luma([0u8]) } else { Luma([255u8]) };
    }

    let mut png_data = Vec::new();
    image::DynamicImage::ImageLuma8(img).write_to(
        &mut std::io::Cursor::new(&mut png_data),
        image::ImageFormat::Png,
    )?;

    Ok(png_data)
}

/// QR code for a card's verification URL, as a PNG data URI
pub fn verification_qr_data_uri(base_url: &str, code: &str) -> Result<String, QrGenerationError> {
    let png = generate_qr_png(&verification_url(base_url, code))?;
    Ok(images::png_data_uri(&png))
}
