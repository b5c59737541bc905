//! Streaming helpers.
//!
//! The HTTP layer sends the synthesized sentences as one response body. Each
//! sentence's audio is yielded as its own element, in order, so a chunk is
//! never split or merged across sentence boundaries; the transport
//! concatenates them.

use std::convert::Infallible;

use bytes::Bytes;
use futures_core::Stream;

/// Lazily yield `chunks` one sentence at a time.
///
/// The stream is finite and is consumed by reading it; it cannot be
/// restarted.
pub fn audio_stream(chunks: Vec<Bytes>) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    async_stream::stream! {
        for chunk in chunks {
            yield Ok::<Bytes, Infallible>(chunk);
        }
    }
}
