use crate::codec::Codec;
use crate::encoder::StreamEncoder;
use crate::policy::Compressible;
use crate::sink::{BodyLength, ResponseSink};
use compression_core::Level;
use http::{HeaderMap, StatusCode, header};
use std::io::{self, Write};
use std::mem;
use tracing::{debug, trace, warn};

/// A response writer that compresses the body when the policy allows it.
///
/// The decision is made once, when headers are committed with
/// [`write_header`](Self::write_header). From then on every body write goes
/// through the encoder if one was attached, or straight to the sink if not.
/// [`close`](Self::close) must be called once the body is complete so the
/// encoder can emit its trailer.
#[derive(Debug)]
pub struct CompressWriter<S, P> {
    sink: S,
    policy: P,
    codec: Codec,
    level: Level,
    body_len: BodyLength,
    state: State,
}

/// Header and body progress of one response.
#[derive(Debug)]
enum State {
    /// Headers not committed yet.
    Pending,
    /// Committed without compression.
    Identity,
    /// Committed with an encoder attached.
    Encoding(StreamEncoder),
    /// Encoder finished by `close`.
    Finished,
}

impl<S, P> CompressWriter<S, P>
where
    S: ResponseSink,
    P: Compressible,
{
    /// Creates a writer that will compress with `codec` if `policy` agrees.
    ///
    /// `body_len` is the response's running body count; it is read when
    /// headers are committed.
    pub fn new(sink: S, codec: Codec, policy: P, body_len: BodyLength) -> Self {
        Self {
            sink,
            policy,
            codec,
            level: Level::Default,
            body_len,
            state: State::Pending,
        }
    }

    /// Sets the compression level used if an encoder is attached.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Returns the negotiated codec.
    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Returns `true` once an encoder has been attached, including after close.
    pub fn is_compressing(&self) -> bool {
        matches!(self.state, State::Encoding(_) | State::Finished)
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &HeaderMap {
        self.sink.headers()
    }

    /// Returns the response headers for modification.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.sink.headers_mut()
    }

    /// Decides on compression and commits headers to the sink.
    ///
    /// Headers are rewritten before the sink sees the commit. Only the first
    /// call decides; later calls are forwarded untouched.
    pub fn write_header(&mut self, status: StatusCode) {
        if let State::Pending = self.state {
            self.state = match self.select_encoder(status) {
                Some(encoder) => State::Encoding(encoder),
                None => State::Identity,
            };
        }
        self.sink.write_header(status);
    }

    /// Finishes the encoder, if any, writing its trailer to the sink.
    ///
    /// Without an encoder this does nothing; the sink itself stays open.
    /// Once an encoder is finished, further body writes fail.
    pub fn close(&mut self) -> io::Result<()> {
        match mem::replace(&mut self.state, State::Finished) {
            State::Encoding(encoder) => encoder.finish(&mut self.sink),
            State::Finished => Ok(()),
            other => {
                self.state = other;
                Ok(())
            }
        }
    }

    /// Returns a reference to the underlying sink.
    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    /// Returns a mutable reference to the underlying sink.
    ///
    /// Writing to it directly while an encoder is attached corrupts the body.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consumes the writer, returning the underlying sink.
    ///
    /// Call [`close`](Self::close) first; an unfinished encoder is dropped.
    pub fn into_inner(self) -> S {
        self.sink
    }

    fn select_encoder(&mut self, status: StatusCode) -> Option<StreamEncoder> {
        if is_bodyless(status) {
            return None;
        }

        let headers = self.sink.headers();
        if is_already_encoded(headers) {
            return None;
        }

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let content_length = self.body_len.get();

        if !self.policy.compressible(content_type, content_length) {
            debug!(
                status = status.as_u16(),
                content_type, content_length, "response not compressible"
            );
            return None;
        }

        let encoder = match StreamEncoder::new(self.codec, self.level) {
            Ok(encoder) => encoder,
            Err(e) => {
                warn!(cause = %e, "failed to create encoder, sending uncompressed");
                return None;
            }
        };

        debug!(
            encoding = self.codec.content_encoding(),
            status = status.as_u16(),
            content_length,
            "compressing response"
        );

        let headers = self.sink.headers_mut();
        add_vary_accept_encoding(headers);
        headers.insert(
            header::CONTENT_ENCODING,
            header::HeaderValue::from_static(self.codec.content_encoding()),
        );

        // The compressed size is unknown until the stream finishes
        headers.remove(header::CONTENT_LENGTH);

        // Ranges of the identity body don't apply to the encoded one
        headers.remove(header::ACCEPT_RANGES);

        Some(encoder)
    }
}

impl<S, P> Write for CompressWriter<S, P>
where
    S: ResponseSink,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = match &mut self.state {
            State::Encoding(encoder) => encoder.write(buf, &mut self.sink).map(|()| buf.len()),
            State::Finished => Err(io::Error::other("write after compressed body was closed")),
            State::Pending | State::Identity => self.sink.write(buf),
        };
        if let Err(e) = &result {
            trace!("error writing response body: {}", e);
        }
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        if let State::Encoding(encoder) = &mut self.state {
            encoder.flush(&mut self.sink)?;
        }
        self.sink.flush()
    }
}

/// Statuses that never carry a body.
fn is_bodyless(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT | StatusCode::NOT_MODIFIED
    )
}

/// Checks if the body already carries a real content coding.
///
/// `identity` and empty values mean the body is not encoded.
fn is_already_encoded(headers: &HeaderMap) -> bool {
    headers.get_all(header::CONTENT_ENCODING).iter().any(|v| {
        v.to_str().map_or(true, |v| {
            v.split(',').any(|coding| {
                let coding = coding.trim();
                !coding.is_empty() && !coding.eq_ignore_ascii_case("identity")
            })
        })
    })
}

/// Adds Accept-Encoding to the Vary header if not already present.
fn add_vary_accept_encoding(headers: &mut HeaderMap) {
    for vary in headers.get_all(header::VARY) {
        if let Ok(vary_str) = vary.to_str() {
            let covered = vary_str.split(',').any(|v| {
                let v = v.trim();
                v == "*" || v.eq_ignore_ascii_case("accept-encoding")
            });
            if covered {
                return;
            }
        }
    }

    headers.append(
        header::VARY,
        header::HeaderValue::from_static("Accept-Encoding"),
    );
}
