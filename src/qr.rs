//! ODK Collect provisioning QR codes.
//!
//! Collect is configured by scanning a QR code whose payload is a settings
//! JSON document with fixed top-level keys `general`, `admin`, and `project`,
//! zlib-compressed and base64-encoded. This module builds that payload,
//! renders it as a QR image, and reverses the transform from a scanned image.

use crate::error::{OdkError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{GrayImage, Luma};
use qrcode::QrCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::{Read, Write};

/// Client settings embedded in a Collect provisioning QR code.
///
/// All three keys are always present in the emitted JSON, even when empty;
/// Collect rejects payloads missing any of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectSettings {
    pub general: Map<String, Value>,
    pub admin: Map<String, Value>,
    pub project: Map<String, Value>,
}

impl CollectSettings {
    /// Create an empty settings document
    pub fn new() -> Self {
        CollectSettings::default()
    }

    /// Set the server URL Collect submits to
    pub fn with_server_url(self, url: impl Into<String>) -> Self {
        self.with_general("server_url", Value::String(url.into()))
    }

    /// Set a key in the `general` section
    pub fn with_general(mut self, key: impl Into<String>, value: Value) -> Self {
        self.general.insert(key.into(), value);
        self
    }

    /// Set a key in the `admin` section
    pub fn with_admin(mut self, key: impl Into<String>, value: Value) -> Self {
        self.admin.insert(key.into(), value);
        self
    }

    /// Set a key in the `project` section (display name, icon, color)
    pub fn with_project(mut self, key: impl Into<String>, value: Value) -> Self {
        self.project.insert(key.into(), value);
        self
    }
}

/// A rendered provisioning QR code together with its payload
#[derive(Debug, Clone)]
pub struct ProvisionedQr {
    /// The settings the code was built from
    pub settings: CollectSettings,
    /// zlib-compressed, base64-encoded settings JSON
    pub encoded: String,
    /// The rendered QR image
    pub image: GrayImage,
}

impl ProvisionedQr {
    /// Build the full payload-plus-image bundle from a settings document
    pub fn from_settings(settings: CollectSettings) -> Result<Self> {
        let encoded = encode_settings(&settings)?;
        let image = render_qr(&encoded)?;
        Ok(ProvisionedQr {
            settings,
            encoded,
            image,
        })
    }

    /// The QR image as PNG bytes
    pub fn png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| OdkError::Qr(e.to_string()))?;
        Ok(bytes)
    }
}

/// Serialize settings to JSON, zlib-compress, base64-encode.
///
/// Serialization failure here is a real error and propagates; this is the one
/// operation where a non-encodable structure crosses the boundary.
pub fn encode_settings(settings: &CollectSettings) -> Result<String> {
    let json = serde_json::to_vec(settings)?;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;
    Ok(STANDARD.encode(compressed))
}

/// Reverse of [`encode_settings`]: base64-decode, decompress, parse JSON
pub fn decode_settings(encoded: &str) -> Result<Value> {
    let compressed = STANDARD.decode(encoded.trim())?;
    let mut decoder = ZlibDecoder::new(&compressed[..]);
    let mut json = Vec::new();
    decoder.read_to_end(&mut json)?;
    Ok(serde_json::from_slice(&json)?)
}

/// Render an encoded settings payload as a QR image
pub fn render_qr(encoded: &str) -> Result<GrayImage> {
    let code = QrCode::new(encoded.as_bytes()).map_err(|e| OdkError::Qr(e.to_string()))?;
    Ok(code.render::<Luma<u8>>().min_dimensions(240, 240).build())
}

/// Decode a QR image blob (PNG, JPEG, ...) back to its encoded payload string
pub fn read_qr(image_bytes: &[u8]) -> Result<String> {
    let img = image::load_from_memory(image_bytes)
        .map_err(|e| OdkError::Qr(e.to_string()))?
        .to_luma8();
    read_qr_image(&img)
}

/// Decode an already-loaded grayscale QR image back to its payload string
pub fn read_qr_image(img: &GrayImage) -> Result<String> {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        img.width() as usize,
        img.height() as usize,
        |x, y| img.get_pixel(x as u32, y as u32)[0],
    );
    let grids = prepared.detect_grids();
    let grid = grids
        .first()
        .ok_or_else(|| OdkError::Qr("no QR code found in image".to_string()))?;
    let (_meta, content) = grid
        .decode()
        .map_err(|e| OdkError::Qr(e.to_string()))?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use serde_json::json;

    fn fixture_settings() -> CollectSettings {
        CollectSettings::new()
            .with_server_url("https://central.example.com/v1/key/abc123/projects/7")
            .with_general("form_update_mode", json!("match_exactly"))
            .with_project("name", json!("household survey"))
            .with_admin("change_server", json!(false))
    }

    #[test]
    fn test_emitted_json_always_has_all_three_sections() {
        let json = serde_json::to_value(CollectSettings::new()).unwrap();
        assert!(json.get("general").is_some());
        assert!(json.get("admin").is_some());
        assert!(json.get("project").is_some());
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let settings = fixture_settings();
        let encoded = encode_settings(&settings).unwrap();

        let decoded = decode_settings(&encoded).unwrap();
        assert_eq!(decoded, serde_json::to_value(&settings).unwrap());
    }

    #[test]
    fn test_decompressed_bytes_are_identical() {
        let settings = fixture_settings();
        let encoded = encode_settings(&settings).unwrap();

        let compressed = STANDARD.decode(&encoded).unwrap();
        let mut decoder = ZlibDecoder::new(&compressed[..]);
        let mut bytes = Vec::new();
        decoder.read_to_end(&mut bytes).unwrap();

        assert_eq!(bytes, serde_json::to_vec(&settings).unwrap());
    }

    #[test]
    fn test_render_then_read_reproduces_payload() {
        let encoded = encode_settings(&fixture_settings()).unwrap();
        let qr = ProvisionedQr::from_settings(fixture_settings()).unwrap();

        let scanned = read_qr(&qr.png().unwrap()).unwrap();
        assert_eq!(scanned, encoded);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_settings("not base64 at all!!!").is_err());
        // valid base64 but not zlib data
        assert!(decode_settings(&STANDARD.encode(b"plain text")).is_err());
    }

    #[test]
    fn test_read_qr_rejects_non_image_bytes() {
        assert!(read_qr(b"definitely not a png").is_err());
    }
}
