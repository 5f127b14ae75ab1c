use crate::codec::Codec;
use crate::policy::{Compressible, DefaultCompress};
use crate::sink::{BodyLength, ResponseSink};
use crate::writer::CompressWriter;
use compression_core::Level;

/// Response compression settings.
///
/// Holds the policy and encoder level shared by every response, and builds a
/// [`CompressWriter`] per response when the client asked for a supported
/// encoding.
#[derive(Debug, Clone)]
pub struct Compression<P = DefaultCompress> {
    policy: P,
    level: Level,
}

impl Compression {
    /// Creates compression settings with the default policy and level.
    pub fn new() -> Self {
        Self {
            policy: DefaultCompress,
            level: Level::Default,
        }
    }
}

impl Default for Compression {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Compression<P> {
    /// Replaces the policy deciding which responses are compressed.
    pub fn policy<Q: Compressible>(self, policy: Q) -> Compression<Q> {
        Compression {
            policy,
            level: self.level,
        }
    }

    /// Sets the encoder compression level.
    ///
    /// A precise level outside `0..=9` makes encoder setup fail, and
    /// responses are then sent uncompressed.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Returns the configured policy.
    pub fn get_policy(&self) -> &P {
        &self.policy
    }

    /// Wraps `sink` in a compressing writer if `accept_encoding` names a
    /// supported encoding first.
    ///
    /// Otherwise the sink is handed back untouched in `Err`, and the body
    /// should be written to it directly.
    pub fn wrap<S>(
        &self,
        sink: S,
        accept_encoding: &str,
        body_len: BodyLength,
    ) -> Result<CompressWriter<S, P>, S>
    where
        S: ResponseSink,
        P: Compressible + Clone,
    {
        match Codec::from_accept_encoding(accept_encoding) {
            Some(codec) => Ok(
                CompressWriter::new(sink, codec, self.policy.clone(), body_len)
                    .with_level(self.level),
            ),
            None => Err(sink),
        }
    }
}
