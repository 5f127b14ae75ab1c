use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// The raw response a server hands to the application.
///
/// A sink owns the header map, the one-shot status line commit and the byte
/// stream the body is written into. Committing more than once is up to the
/// implementation to reject or ignore.
pub trait ResponseSink: Write {
    /// Returns the response headers.
    fn headers(&self) -> &HeaderMap;

    /// Returns the response headers for modification.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Commits the status line and headers.
    fn write_header(&mut self, status: StatusCode);
}

impl<S: ResponseSink + ?Sized> ResponseSink for &mut S {
    fn headers(&self) -> &HeaderMap {
        (**self).headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        (**self).write_header(status)
    }
}

/// Running count of body bytes for one response.
///
/// The response owns the count; clones share it, so a compressing writer can
/// read how much body is known at the moment headers are committed. `0` means
/// nothing is known yet.
#[derive(Debug, Clone, Default)]
pub struct BodyLength(Arc<AtomicUsize>);

impl BodyLength {
    /// Creates a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current count.
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    /// Replaces the count, e.g. with the full length of a buffered body.
    pub fn set(&self, len: usize) {
        self.0.store(len, Ordering::Relaxed);
    }

    /// Adds `n` written bytes to the count.
    pub fn add(&self, n: usize) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }
}

/// A sink that keeps the whole response in memory.
///
/// Only the first `write_header` call takes effect, like a real connection.
#[derive(Debug, Default)]
pub struct MemorySink {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the committed status, if headers were written.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the bytes written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consumes the sink, returning the written bytes.
    pub fn into_body(self) -> Bytes {
        self.body.freeze()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ResponseSink for MemorySink {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header;

    #[test]
    fn test_body_length_shared_between_clones() {
        let len = BodyLength::new();
        let view = len.clone();

        len.add(10);
        len.add(5);
        assert_eq!(view.get(), 15);

        view.set(2048);
        assert_eq!(len.get(), 2048);
    }

    #[test]
    fn test_memory_sink_commits_once() {
        let mut sink = MemorySink::new();
        assert_eq!(sink.status(), None);

        sink.write_header(StatusCode::CREATED);
        sink.write_header(StatusCode::OK);
        assert_eq!(sink.status(), Some(StatusCode::CREATED));
    }

    #[test]
    fn test_memory_sink_collects_body() {
        let mut sink = MemorySink::new();
        sink.write_all(b"hello ").unwrap();
        sink.write_all(b"world").unwrap();
        assert_eq!(sink.body(), b"hello world");
        assert_eq!(sink.into_body(), Bytes::from_static(b"hello world"));
    }

    #[test]
    fn test_borrowed_sink_forwards() {
        let mut sink = MemorySink::new();
        {
            let mut borrowed = &mut sink;
            borrowed
                .headers_mut()
                .insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());
            ResponseSink::write_header(&mut borrowed, StatusCode::OK);
            borrowed.write_all(b"ok").unwrap();
        }
        assert_eq!(sink.headers().get(header::CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(sink.status(), Some(StatusCode::OK));
        assert_eq!(sink.body(), b"ok");
    }
}
