//! Content-addressed cache for locally registered GGUF/SMQ model files:
//! registration (local copy or streamed HTTP(S) download), manifest
//! persistence, and SHA-256 integrity verification (\S4.8).
#![deny(missing_docs)]

mod cache;
mod cancellation;
mod config;
mod error;
mod hash;
mod id;
mod manifest;

pub use cache::{ModelCache, VerifyReport};
pub use cancellation::CancellationToken;
pub use config::{CacheConfig, CACHE_ROOT_ENV, DEFAULT_DOWNLOAD_TIMEOUT};
pub use error::CacheError;
pub use hash::sha256_file;
pub use manifest::{FileEntry, Manifest, ModelFormat};
