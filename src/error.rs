use crate::codec::Codec;

/// Errors raised while setting up a streaming encoder.
#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    /// The configured compression level is out of range for the codec.
    #[error("invalid {codec} compression level {level}, expected 0..=9")]
    InvalidLevel {
        /// Codec the encoder was requested for.
        codec: Codec,
        /// The rejected level.
        level: i32,
    },
}
