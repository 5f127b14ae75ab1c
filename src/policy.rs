use std::fmt;
use std::sync::Arc;

/// Default size at or below which a known-length body is left uncompressed.
pub const DEFAULT_THRESHOLD: usize = 1024;

/// Decides whether a response body should be compressed.
///
/// `content_length == 0` means the length is not known yet: the body may be
/// streamed, or written after the headers. Implementations must be
/// deterministic for the same inputs.
pub trait Compressible {
    /// Returns `true` if a body with this content type and length should be compressed.
    fn compressible(&self, content_type: &str, content_length: usize) -> bool;
}

/// The stock policy: compress anything typed, except small bodies of known length.
///
/// Equivalent to [`Threshold::new(DEFAULT_THRESHOLD)`](Threshold::new).
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCompress;

impl Compressible for DefaultCompress {
    fn compressible(&self, content_type: &str, content_length: usize) -> bool {
        Threshold::new(DEFAULT_THRESHOLD).compressible(content_type, content_length)
    }
}

/// A policy with a configurable small-body threshold.
///
/// Bodies whose known length is `1..=threshold` bytes are not compressed.
/// Unknown lengths (`0`) and anything larger are compressed whenever a
/// content type is set.
#[derive(Debug, Clone, Copy)]
pub struct Threshold {
    threshold: usize,
}

impl Threshold {
    /// Creates a policy that skips bodies of at most `threshold` bytes.
    pub const fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// Returns the configured threshold.
    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl Compressible for Threshold {
    fn compressible(&self, content_type: &str, content_length: usize) -> bool {
        if content_length > 0 && content_length <= self.threshold {
            return false;
        }
        !content_type.is_empty()
    }
}

/// Returns a policy backed by a closure.
pub fn policy_fn<F>(f: F) -> PolicyFn<F>
where
    F: Fn(&str, usize) -> bool,
{
    PolicyFn { f }
}

/// A policy created by [`policy_fn`].
#[derive(Clone, Copy)]
pub struct PolicyFn<F> {
    f: F,
}

impl<F> fmt::Debug for PolicyFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyFn").finish_non_exhaustive()
    }
}

impl<F> Compressible for PolicyFn<F>
where
    F: Fn(&str, usize) -> bool,
{
    fn compressible(&self, content_type: &str, content_length: usize) -> bool {
        (self.f)(content_type, content_length)
    }
}

impl<P: Compressible + ?Sized> Compressible for &P {
    fn compressible(&self, content_type: &str, content_length: usize) -> bool {
        (**self).compressible(content_type, content_length)
    }
}

impl<P: Compressible + ?Sized> Compressible for Box<P> {
    fn compressible(&self, content_type: &str, content_length: usize) -> bool {
        (**self).compressible(content_type, content_length)
    }
}

impl<P: Compressible + ?Sized> Compressible for Arc<P> {
    fn compressible(&self, content_type: &str, content_length: usize) -> bool {
        (**self).compressible(content_type, content_length)
    }
}
