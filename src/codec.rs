use crate::error::EncoderError;
use compression_codecs::{EncodeV2, deflate::DeflateEncoder, gzip::GzipEncoder};
use compression_core::Level;
use std::fmt;

/// Supported compression codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Gzip compression.
    Gzip,
    /// Raw deflate compression.
    Deflate,
}

impl Codec {
    /// Returns the Content-Encoding header value for this codec.
    pub fn content_encoding(&self) -> &'static str {
        match self {
            Codec::Gzip => "gzip",
            Codec::Deflate => "deflate",
        }
    }

    /// Creates a new encoder for this codec at the given level.
    ///
    /// `Level::Precise` must be within `0..=9`; other levels map onto the
    /// codec's own presets.
    pub fn encoder(&self, level: Level) -> Result<Box<dyn EncodeV2 + Send>, EncoderError> {
        if let Level::Precise(precise) = level {
            if !(0..=9).contains(&precise) {
                return Err(EncoderError::InvalidLevel {
                    codec: *self,
                    level: precise,
                });
            }
        }

        Ok(match self {
            Codec::Gzip => Box::new(GzipEncoder::new(level.into())),
            Codec::Deflate => Box::new(DeflateEncoder::new(level.into())),
        })
    }

    /// Picks the codec from a client's accepted encodings.
    ///
    /// Only the first comma-separated token counts: it is trimmed and must be
    /// exactly `gzip` or `deflate`. Quality values are not honored, and a
    /// supported encoding later in the list does not rescue an unsupported
    /// first choice.
    pub fn from_accept_encoding(header: &str) -> Option<Codec> {
        let first = header.split(',').next().unwrap_or_default().trim();

        match first {
            "gzip" => Some(Codec::Gzip),
            "deflate" => Some(Codec::Deflate),
            _ => None,
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content_encoding())
    }
}
