//! Object storage boundary
//!
//! The exporter only ever writes: it hands a byte stream and a key to
//! [`FileStorage::put_stream`] and publishes [`FileStorage::url`].

pub mod local;

pub use local::LocalStorage;

use crate::core::export::ExportContext;
use crate::domain::Result;
use async_trait::async_trait;
use tokio::io::AsyncRead;

/// Byte stream handed to a storage client
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// Storage client accepting streamed uploads
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store everything read from `reader` under `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the stream fails or the object cannot be written.
    async fn put_stream(&self, ctx: &ExportContext, key: &str, reader: ByteStream) -> Result<()>;

    /// Public retrieval URL for `key`
    fn url(&self, key: &str) -> String;
}
