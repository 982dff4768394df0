use crate::error::app_error::AppError;
use base64::{Engine as _, engine::general_purpose};
use qrcode::QrCode;

/// URL a student lands on after scanning a session QR code.
pub fn attendance_url(public_url: &str, token: &str) -> String {
    format!("{}/attendance/mark?token={}", public_url.trim_end_matches('/'), urlencoding::encode(token))
}

/// Renders `content` as a QR code SVG wrapped in a base64 data URL for an `<img>` tag.
pub fn qr_data_url(content: &str) -> Result<String, AppError> {
    let qr = QrCode::new(content.as_bytes()).map_err(|e| AppError::BadRequest(format!("Failed to generate QR code: {}", e)))?;

    let qr_svg = qr.render::<qrcode::render::svg::Color>().min_dimensions(250, 250).build();

    let base64_svg = general_purpose::STANDARD.encode(qr_svg.as_bytes());
    Ok(format!("data:image/svg+xml;base64,{}", base64_svg))
}
