//! `data:` URI parsing for generated media.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;

use crate::error::ValidationError;

const FIELD: &str = "animationDataUri";

/// A validated `data:<type>/<subtype>[;params];base64,<payload>` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    raw: String,
    mime_end: usize,
    payload_start: usize,
}

impl DataUri {
    /// Parses and validates `raw`, keeping it byte-for-byte.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        let invalid = |why: &str| ValidationError::new(FIELD, format!("Invalid data URI: {why}."));

        let rest = raw
            .strip_prefix("data:")
            .ok_or_else(|| invalid("missing `data:` prefix"))?;
        let comma = rest
            .find(',')
            .ok_or_else(|| invalid("missing `,` before payload"))?;
        let header = &rest[..comma];
        let payload = &rest[comma + 1..];

        let mut params = header.split(';');
        let mime = params.next().unwrap_or_default();
        if !is_mime_type(mime) {
            return Err(invalid("missing or malformed MIME type"));
        }
        if !params.any(|p| p.eq_ignore_ascii_case("base64")) {
            return Err(invalid("payload is not base64-encoded"));
        }
        if payload.is_empty() {
            return Err(invalid("empty payload"));
        }
        BASE64_STANDARD
            .decode(payload)
            .map_err(|_| invalid("payload is not valid base64"))?;

        let prefix = "data:".len();
        Ok(Self {
            mime_end: prefix + mime.len(),
            payload_start: prefix + comma + 1,
            raw,
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.raw["data:".len()..self.mime_end]
    }

    pub fn payload(&self) -> &str {
        &self.raw[self.payload_start..]
    }

    /// Decodes the payload into bytes.
    pub fn decode(&self) -> Vec<u8> {
        // Validated in `parse`.
        BASE64_STANDARD.decode(self.payload()).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for DataUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_mime_type(mime: &str) -> bool {
    let token = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || "!#$&^_.+-".contains(c))
    };
    match mime.split_once('/') {
        Some((kind, sub)) => token(kind) && token(sub),
        None => false,
    }
}
