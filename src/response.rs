use crate::compression::Compression;
use crate::policy::{Compressible, DefaultCompress};
use crate::sink::{BodyLength, ResponseSink};
use crate::writer::CompressWriter;
use http::{HeaderMap, StatusCode, header};
use std::io::{self, Write};
use tracing::warn;

/// Where body bytes go for one response.
#[derive(Debug)]
enum Output<S, P> {
    Compress(CompressWriter<S, P>),
    Direct(S),
}

/// A response being written by application code.
///
/// Owns the body byte count and routes writes through a [`CompressWriter`]
/// when the client negotiated a supported encoding, or straight to the sink
/// otherwise. Headers are committed at most once; the first body write
/// commits `200 OK` if nothing was committed yet.
#[derive(Debug)]
pub struct Response<S, P = DefaultCompress> {
    output: Output<S, P>,
    body_len: BodyLength,
    status: Option<StatusCode>,
}

impl<S, P> Response<S, P>
where
    S: ResponseSink,
    P: Compressible + Clone,
{
    /// Starts a response on `sink` for a client accepting `accept_encoding`.
    pub fn new(sink: S, accept_encoding: &str, compression: &Compression<P>) -> Self {
        let body_len = BodyLength::new();
        let output = match compression.wrap(sink, accept_encoding, body_len.clone()) {
            Ok(writer) => Output::Compress(writer),
            Err(sink) => Output::Direct(sink),
        };

        Self {
            output,
            body_len,
            status: None,
        }
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &HeaderMap {
        match &self.output {
            Output::Compress(writer) => writer.headers(),
            Output::Direct(sink) => sink.headers(),
        }
    }

    /// Returns the response headers for modification.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        match &mut self.output {
            Output::Compress(writer) => writer.headers_mut(),
            Output::Direct(sink) => sink.headers_mut(),
        }
    }

    /// Returns the committed status, if headers were written.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the number of body bytes known so far.
    pub fn body_len(&self) -> usize {
        self.body_len.get()
    }

    /// Returns `true` if the body is being compressed.
    pub fn is_compressed(&self) -> bool {
        matches!(&self.output, Output::Compress(writer) if writer.is_compressing())
    }

    /// Commits the status line and headers.
    ///
    /// Repeated calls are ignored.
    pub fn write_header(&mut self, status: StatusCode) {
        if let Some(committed) = self.status {
            warn!(
                committed = committed.as_u16(),
                status = status.as_u16(),
                "headers already written"
            );
            return;
        }
        self.status = Some(status);

        match &mut self.output {
            Output::Compress(writer) => writer.write_header(status),
            Output::Direct(sink) => sink.write_header(status),
        }
    }

    /// Sends a complete body.
    ///
    /// The full length is recorded before headers are committed, so a small
    /// body is sent uncompressed with its `Content-Length`. Fails if headers
    /// were already written.
    pub fn respond(&mut self, status: StatusCode, body: &[u8]) -> io::Result<()> {
        if let Some(committed) = self.status {
            warn!(
                committed = committed.as_u16(),
                status = status.as_u16(),
                "respond after headers already written"
            );
            return Err(io::Error::other("headers already written"));
        }

        self.body_len.set(body.len());
        if !body.is_empty() && !self.headers().contains_key(header::CONTENT_LENGTH) {
            self.headers_mut()
                .insert(header::CONTENT_LENGTH, header::HeaderValue::from(body.len()));
        }
        self.write_header(status);

        let written = match &mut self.output {
            Output::Compress(writer) => writer.write_all(body),
            Output::Direct(sink) => sink.write_all(body),
        };
        written?;
        self.close()
    }

    /// Finishes the body, flushing any encoder trailer to the sink.
    pub fn close(&mut self) -> io::Result<()> {
        match &mut self.output {
            Output::Compress(writer) => writer.close(),
            Output::Direct(_) => Ok(()),
        }
    }

    /// Consumes the response, returning the underlying sink.
    pub fn into_inner(self) -> S {
        match self.output {
            Output::Compress(writer) => writer.into_inner(),
            Output::Direct(sink) => sink,
        }
    }
}

impl<S, P> Write for Response<S, P>
where
    S: ResponseSink,
    P: Compressible + Clone,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.status.is_none() {
            self.write_header(StatusCode::OK);
        }

        let n = match &mut self.output {
            Output::Compress(writer) => writer.write(buf)?,
            Output::Direct(sink) => sink.write(buf)?,
        };
        self.body_len.add(n);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.output {
            Output::Compress(writer) => writer.flush(),
            Output::Direct(sink) => sink.flush(),
        }
    }
}
