//! Identity code encoding and scanned payload decoding.
//!
//! # Responsibility
//! - Render `name + "\n" + email` as a crisp, scannable QR bitmap.
//! - Parse scanned payload strings back into name/email pairs.
//!
//! # Invariants
//! - Error correction level is fixed at `M`.
//! - Upscaling is integer nearest-neighbor; every module maps to a solid
//!   `scale x scale` block with no intermediate gray values.
//! - `encode` never fails: encoder errors yield the placeholder image.
//! - `decode(&payload(n, e)) == (n, e)` for inputs without `\n`.

use image::{GrayImage, ImageFormat, Luma};
use log::{debug, warn};
use qrcode::{Color, EcLevel, QrCode};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Cursor;

/// Separator between name and email inside the payload.
pub const PAYLOAD_SEPARATOR: char = '\n';
/// Default pixels per QR module.
pub const DEFAULT_SCALE: u32 = 2;
/// Smallest accepted pixels-per-module factor.
pub const MIN_SCALE: u32 = 2;
/// Largest accepted pixels-per-module factor.
pub const MAX_SCALE: u32 = 32;
/// Light modules surrounding the symbol on every side.
pub const QUIET_ZONE_MODULES: u32 = 4;
/// Side length of the placeholder image in pixels.
pub const PLACEHOLDER_SIZE: u32 = 64;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Why a scanned payload was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// Payload did not split into exactly two segments.
    SegmentCount(usize),
    EmptyName,
    EmptyEmail,
}

impl Display for MalformedReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SegmentCount(count) => write!(f, "expected 2 segments, found {count}"),
            Self::EmptyName => write!(f, "name segment is empty"),
            Self::EmptyEmail => write!(f, "email segment is empty"),
        }
    }
}

/// Identity codec error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Scanned payload is not a `name\nemail` pair; the scan must be discarded.
    MalformedPayload(MalformedReason),
    /// QR encoder refused the payload. Masked by `encode`.
    Encode(String),
    /// Bitmap could not be serialized.
    Export(String),
    /// Scale factor outside `MIN_SCALE..=MAX_SCALE`.
    InvalidScale(u32),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedPayload(reason) => write!(f, "malformed identity payload: {reason}"),
            Self::Encode(message) => write!(f, "identity code encoding failed: {message}"),
            Self::Export(message) => write!(f, "identity image export failed: {message}"),
            Self::InvalidScale(scale) => write!(
                f,
                "scale factor {scale} outside supported range {MIN_SCALE}..={MAX_SCALE}"
            ),
        }
    }
}

impl Error for CodecError {}

/// Name/email pair carried by an identity code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPayload {
    pub name: String,
    pub email: String,
}

/// Rendered identity code, or the placeholder shown when encoding failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityImage {
    bitmap: GrayImage,
    placeholder: bool,
}

impl IdentityImage {
    /// Deterministic "error" image: a crossed-out circle.
    pub fn placeholder() -> Self {
        Self {
            bitmap: placeholder_bitmap(),
            placeholder: true,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    /// Luma value (0 dark, 255 light) at pixel `(x, y)`.
    pub fn luma_at(&self, x: u32, y: u32) -> Option<u8> {
        self.bitmap.get_pixel_checked(x, y).map(|pixel| pixel.0[0])
    }

    pub fn bitmap(&self) -> &GrayImage {
        &self.bitmap
    }

    /// Encodes the bitmap as PNG for sharing.
    pub fn to_png(&self) -> Result<Vec<u8>, CodecError> {
        let mut buffer = Cursor::new(Vec::new());
        self.bitmap
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|err| CodecError::Export(err.to_string()))?;
        Ok(buffer.into_inner())
    }
}

/// Encoder/decoder for shareable identity codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityCodec {
    scale: u32,
}

impl Default for IdentityCodec {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
        }
    }
}

impl IdentityCodec {
    /// Creates a codec rendering `scale` pixels per module.
    pub fn new(scale: u32) -> Result<Self, CodecError> {
        if !(MIN_SCALE..=MAX_SCALE).contains(&scale) {
            return Err(CodecError::InvalidScale(scale));
        }
        Ok(Self { scale })
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Builds the payload string carried by the code.
    pub fn payload(name: &str, email: &str) -> String {
        format!("{name}{PAYLOAD_SEPARATOR}{email}")
    }

    /// Renders the identity code for `name`/`email`.
    ///
    /// Never fails; encoder errors are logged and replaced with
    /// [`IdentityImage::placeholder`].
    pub fn encode(&self, name: &str, email: &str) -> IdentityImage {
        let payload = Self::payload(name, email);
        match self.render(&payload) {
            Ok(bitmap) => IdentityImage {
                bitmap,
                placeholder: false,
            },
            Err(err) => {
                warn!(
                    "event=identity_encode module=codec status=fallback payload_bytes={} error={}",
                    payload.len(),
                    err
                );
                IdentityImage::placeholder()
            }
        }
    }

    /// Parses a scanned payload into a name/email pair.
    ///
    /// # Errors
    /// - `CodecError::MalformedPayload` unless the payload splits on `\n`
    ///   into exactly two non-blank segments.
    pub fn decode(&self, payload: &str) -> Result<IdentityPayload, CodecError> {
        decode_payload(payload)
    }

    fn render(&self, payload: &str) -> Result<GrayImage, CodecError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
            .map_err(|err| CodecError::Encode(err.to_string()))?;
        let modules = module_bitmap(&code)?;
        Ok(upscale_nearest(&modules, self.scale))
    }
}

/// Parses a scanned payload into a name/email pair.
pub fn decode_payload(payload: &str) -> Result<IdentityPayload, CodecError> {
    let segments: Vec<&str> = payload.split(PAYLOAD_SEPARATOR).collect();
    let reason = match segments.as_slice() {
        [name, email] if !name.trim().is_empty() && !email.trim().is_empty() => {
            return Ok(IdentityPayload {
                name: (*name).to_string(),
                email: (*email).to_string(),
            });
        }
        [name, _] if name.trim().is_empty() => MalformedReason::EmptyName,
        [_, _] => MalformedReason::EmptyEmail,
        other => MalformedReason::SegmentCount(other.len()),
    };
    debug!("event=identity_decode module=codec status=rejected reason={reason}");
    Err(CodecError::MalformedPayload(reason))
}

/// One pixel per module, quiet zone included.
fn module_bitmap(code: &QrCode) -> Result<GrayImage, CodecError> {
    let width = u32::try_from(code.width())
        .map_err(|_| CodecError::Encode("symbol width overflow".to_string()))?;
    let side = width + 2 * QUIET_ZONE_MODULES;
    let mut bitmap = GrayImage::from_pixel(side, side, LIGHT);

    for (index, color) in code.to_colors().into_iter().enumerate() {
        if color != Color::Dark {
            continue;
        }
        let index = index as u32;
        bitmap.put_pixel(
            index % width + QUIET_ZONE_MODULES,
            index / width + QUIET_ZONE_MODULES,
            DARK,
        );
    }
    Ok(bitmap)
}

fn upscale_nearest(source: &GrayImage, scale: u32) -> GrayImage {
    GrayImage::from_fn(source.width() * scale, source.height() * scale, |x, y| {
        *source.get_pixel(x / scale, y / scale)
    })
}

fn placeholder_bitmap() -> GrayImage {
    // Doubled coordinates keep the circle centered without floats.
    let size = PLACEHOLDER_SIZE as i64;
    GrayImage::from_fn(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, |x, y| {
        let dx = 2 * i64::from(x) + 1 - size;
        let dy = 2 * i64::from(y) + 1 - size;
        let distance_sq = dx * dx + dy * dy;
        let on_ring = (52 * 52..=60 * 60).contains(&distance_sq);
        let on_cross = distance_sq <= 44 * 44 && ((dx - dy).abs() <= 6 || (dx + dy).abs() <= 6);
        if on_ring || on_cross {
            DARK
        } else {
            LIGHT
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{
        decode_payload, upscale_nearest, CodecError, IdentityCodec, IdentityImage,
        MalformedReason, DEFAULT_SCALE, PLACEHOLDER_SIZE, QUIET_ZONE_MODULES,
    };
    use image::{GrayImage, Luma};

    #[test]
    fn payload_joins_with_newline() {
        assert_eq!(
            IdentityCodec::payload("Constantin Lisnic", "constantin@lisnic.dev"),
            "Constantin Lisnic\nconstantin@lisnic.dev"
        );
    }

    #[test]
    fn decode_classifies_rejections() {
        assert_eq!(
            decode_payload("no separator"),
            Err(CodecError::MalformedPayload(MalformedReason::SegmentCount(1)))
        );
        assert_eq!(
            decode_payload("a\nb\nc"),
            Err(CodecError::MalformedPayload(MalformedReason::SegmentCount(3)))
        );
        assert_eq!(
            decode_payload("\nb@x.com"),
            Err(CodecError::MalformedPayload(MalformedReason::EmptyName))
        );
        assert_eq!(
            decode_payload("Bob\n  "),
            Err(CodecError::MalformedPayload(MalformedReason::EmptyEmail))
        );
    }

    #[test]
    fn upscale_copies_each_pixel_into_a_solid_block() {
        let mut source = GrayImage::from_pixel(2, 1, Luma([255]));
        source.put_pixel(1, 0, Luma([0]));

        let scaled = upscale_nearest(&source, 3);
        assert_eq!(scaled.dimensions(), (6, 3));
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(scaled.get_pixel(x, y).0[0], 255);
                assert_eq!(scaled.get_pixel(x + 3, y).0[0], 0);
            }
        }
    }

    #[test]
    fn encode_produces_binary_square_with_quiet_zone() {
        let image = IdentityCodec::default().encode("Alice", "a@x.com");
        assert!(!image.is_placeholder());
        assert_eq!(image.width(), image.height());
        assert_eq!(image.width() % DEFAULT_SCALE, 0);

        let modules = image.width() / DEFAULT_SCALE;
        // Version 1..=40 symbols are 21..=177 modules wide.
        assert!(modules >= 21 + 2 * QUIET_ZONE_MODULES);
        assert!(image.bitmap().pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        assert_eq!(image.luma_at(0, 0), Some(255));

        // Top-left finder pattern corner starts right after the quiet zone.
        let corner = QUIET_ZONE_MODULES * DEFAULT_SCALE;
        assert_eq!(image.luma_at(corner, corner), Some(0));
    }

    #[test]
    fn encode_over_capacity_returns_placeholder() {
        let oversized = "x".repeat(5_000);
        let image = IdentityCodec::default().encode(&oversized, "a@x.com");
        assert!(image.is_placeholder());
        assert_eq!(image, IdentityImage::placeholder());
        assert_eq!(image.width(), PLACEHOLDER_SIZE);
    }

    #[test]
    fn new_rejects_scales_outside_range() {
        assert_eq!(IdentityCodec::new(1), Err(CodecError::InvalidScale(1)));
        assert_eq!(IdentityCodec::new(4).unwrap().scale(), 4);
    }

    #[test]
    fn png_export_has_signature() {
        let png = IdentityCodec::default()
            .encode("Alice", "a@x.com")
            .to_png()
            .unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
