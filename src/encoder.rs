use crate::codec::Codec;
use crate::error::EncoderError;
use compression_codecs::EncodeV2;
use compression_core::Level;
use compression_core::util::{PartialBuffer, WriteBuffer};
use std::fmt;
use std::io::{self, Write};

const OUTPUT_BUFFER_SIZE: usize = 8 * 1024; // 8KB output buffer

/// A streaming encoder that writes compressed output into a borrowed writer.
///
/// The encoder never owns its destination: every call receives the writer it
/// should emit into, so the same sink can keep serving headers and raw writes.
pub(crate) struct StreamEncoder {
    codec: Codec,
    encoder: Box<dyn EncodeV2 + Send>,
    output_buffer: Vec<u8>,
}

impl StreamEncoder {
    /// Creates a streaming encoder for `codec` at `level`.
    pub(crate) fn new(codec: Codec, level: Level) -> Result<Self, EncoderError> {
        Ok(Self {
            codec,
            encoder: codec.encoder(level)?,
            output_buffer: vec![0u8; OUTPUT_BUFFER_SIZE],
        })
    }

    /// Compresses all of `input`, emitting whatever the codec produces into `out`.
    ///
    /// The codec may hold back output until it has enough input; use
    /// [`flush`](Self::flush) or [`finish`](Self::finish) to force it out.
    pub(crate) fn write<W: Write + ?Sized>(&mut self, input: &[u8], out: &mut W) -> io::Result<()> {
        let mut input_buf = PartialBuffer::new(input);

        // Keep encoding until all input is consumed
        loop {
            let mut output = WriteBuffer::new_initialized(self.output_buffer.as_mut_slice());

            self.encoder
                .encode(&mut input_buf, &mut output)
                .map_err(io::Error::other)?;

            let written = output.written_len();
            if written > 0 {
                out.write_all(&self.output_buffer[..written])?;
            }

            if input_buf.written_len() >= input.len() {
                return Ok(());
            }

            if written == 0 && input_buf.written_len() == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "encoder made no progress",
                ));
            }
        }
    }

    /// Emits everything buffered so far, ending on a byte boundary the
    /// client can decode up to.
    pub(crate) fn flush<W: Write + ?Sized>(&mut self, out: &mut W) -> io::Result<()> {
        loop {
            let mut output = WriteBuffer::new_initialized(self.output_buffer.as_mut_slice());

            let done = self
                .encoder
                .flush(&mut output)
                .map_err(io::Error::other)?;

            let written = output.written_len();
            if written > 0 {
                out.write_all(&self.output_buffer[..written])?;
            }
            if done {
                return Ok(());
            }
        }
    }

    /// Finishes the stream, writing remaining data and the codec trailer.
    pub(crate) fn finish<W: Write + ?Sized>(mut self, out: &mut W) -> io::Result<()> {
        loop {
            let mut output = WriteBuffer::new_initialized(self.output_buffer.as_mut_slice());

            let done = self
                .encoder
                .finish(&mut output)
                .map_err(io::Error::other)?;

            let written = output.written_len();
            if written > 0 {
                out.write_all(&self.output_buffer[..written])?;
            }
            if done {
                return Ok(());
            }
        }
    }
}

impl fmt::Debug for StreamEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamEncoder")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::{DeflateDecoder, GzDecoder};
    use std::io::Read;

    fn gunzip(data: &[u8]) -> Vec<u8> {
        let mut decoded = Vec::new();
        GzDecoder::new(data).read_to_end(&mut decoded).unwrap();
        decoded
    }

    fn inflate(data: &[u8]) -> Vec<u8> {
        let mut decoded = Vec::new();
        DeflateDecoder::new(data).read_to_end(&mut decoded).unwrap();
        decoded
    }

    fn encode_chunks(codec: Codec, chunks: &[&[u8]]) -> Vec<u8> {
        let mut encoder = StreamEncoder::new(codec, Level::Default).unwrap();
        let mut out = Vec::new();
        for chunk in chunks {
            encoder.write(chunk, &mut out).unwrap();
        }
        encoder.finish(&mut out).unwrap();
        out
    }

    #[test]
    fn test_gzip_header_magic() {
        let out = encode_chunks(Codec::Gzip, &[b"hello world"]);
        assert_eq!(&out[..2], &[0x1f, 0x8b]);
        assert_eq!(gunzip(&out), b"hello world");
    }

    #[test]
    fn test_multiple_chunks() {
        let out = encode_chunks(Codec::Deflate, &[b"hello", b" ", b"world"]);
        assert_eq!(inflate(&out), b"hello world");
    }

    #[test]
    fn test_flush_makes_prefix_decodable() {
        let mut encoder = StreamEncoder::new(Codec::Deflate, Level::Default).unwrap();
        let mut out = Vec::new();
        encoder.write(b"event: ping\n\n", &mut out).unwrap();
        encoder.flush(&mut out).unwrap();

        // The stream is not finished, so decode only what is available.
        let mut decoded = [0u8; 13];
        DeflateDecoder::new(out.as_slice())
            .read_exact(&mut decoded)
            .unwrap();
        assert_eq!(&decoded, b"event: ping\n\n");
    }

    #[test]
    fn test_input_larger_than_output_buffer() {
        let input: Vec<u8> = (0..OUTPUT_BUFFER_SIZE * 4)
            .map(|i| (i.wrapping_mul(7919) % 251) as u8)
            .collect();
        let out = encode_chunks(Codec::Gzip, &[&input]);
        assert_eq!(gunzip(&out), input);
    }

    #[test]
    fn test_invalid_level() {
        assert!(StreamEncoder::new(Codec::Gzip, Level::Precise(10)).is_err());
    }
}
