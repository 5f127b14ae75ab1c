//! Compressing wrapper for HTTP response writers.
//!
//! This crate sits between a server's raw response writer and the code that
//! produces a body. It decides per response whether to gzip or deflate the
//! body and, if so, streams every write through an encoder, without the
//! application changing how it writes.
//!
//! # Example
//!
//! ```
//! use http::{StatusCode, header};
//! use http_compress_writer::{Compression, MemorySink, Response, ResponseSink};
//!
//! let compression = Compression::new();
//! let mut response = Response::new(MemorySink::new(), "gzip, deflate", &compression);
//! response
//!     .headers_mut()
//!     .insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());
//!
//! let body = "hello world\n".repeat(200);
//! response.respond(StatusCode::OK, body.as_bytes()).unwrap();
//!
//! let sink = response.into_inner();
//! assert_eq!(sink.headers()[header::CONTENT_ENCODING], "gzip");
//! ```
//!
//! # Negotiation
//!
//! Only the first comma-separated token of the client's accepted encodings
//! is considered. It must be exactly `gzip` or `deflate` after trimming;
//! quality values are not parsed.
//!
//! # Compression Rules
//!
//! The decision is made once, when headers are committed. The writer will
//! **not** compress responses when:
//! - The status is `204`, `205` or `304`
//! - `Content-Encoding` header is already set
//! - The [`Compressible`] policy declines, given the `Content-Type` and the
//!   body length known at that moment (`0` when unknown)
//! - The encoder cannot be created (the body is then sent as is)
//!
//! # Response Modifications
//!
//! When compression is applied:
//! - `Content-Encoding` header is set to the codec used
//! - `Content-Length` header is removed (compressed size is unknown)
//! - `Accept-Ranges` header is removed
//! - `Vary` header includes `Accept-Encoding`

#![deny(missing_docs)]

mod codec;
mod compression;
mod encoder;
mod error;
mod policy;
mod response;
mod sink;
mod writer;

pub use codec::Codec;
pub use compression::Compression;
pub use compression_core::Level;
pub use error::EncoderError;
pub use policy::{Compressible, DEFAULT_THRESHOLD, DefaultCompress, PolicyFn, Threshold, policy_fn};
pub use response::Response;
pub use sink::{BodyLength, MemorySink, ResponseSink};
pub use writer::CompressWriter;
