use base64::{engine::general_purpose::STANDARD, Engine as _};

const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Embeds PNG bytes (logos, signatures, QR codes) for use in `<img src>`
pub fn png_data_uri(bytes: &[u8]) -> String {
    format!("{}{}", PNG_DATA_URI_PREFIX, STANDARD.encode(bytes))
}

/// Same as `png_data_uri`, empty when there is no image
pub fn optional_png_data_uri(bytes: Option<&[u8]>) -> String {
    bytes.map(png_data_uri).unwrap_or_default()
}

/// Decodes an uploaded image given either as bare base64 or as a PNG data URI
pub fn decode_uploaded_image(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let trimmed = encoded.trim();
    let payload = trimmed
        .strip_prefix(PNG_DATA_URI_PREFIX)
        .unwrap_or(trimmed);

    STANDARD.decode(payload)
}
