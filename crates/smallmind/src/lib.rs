//! A small, dependency-light toolkit for working with local GGUF/SMQ model
//! files: quantized tensor decoding, container parsing, GGUF-to-SMQ
//! import, BPE tokenization, and a content-addressed model cache.
//!
//! This crate is a thin facade: each concern lives in its own
//! single-purpose crate (re-exported here as a module), and all of them
//! are individually feature-gated so a consumer that only needs, say,
//! GGUF parsing doesn't pull in `reqwest`/`tokio` for the cache.
//!
//! ```no_run
//! # #[cfg(all(feature = "gguf", feature = "import"))]
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! smallmind::import::import("model.gguf", "model.smq")?;
//! let reader = smallmind::smq::SmqStreamReader::open("model.smq")?;
//! println!("{} tensors", reader.info().tensor_count());
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]

/// Half-precision (IEEE 754 binary16) float conversion.
#[cfg(feature = "fp16")]
pub use smallmind_fp16 as fp16;

/// Decoding and encoding of GGML/GGUF quantization block formats.
#[cfg(feature = "quant")]
pub use smallmind_quant as quant;

/// Read-only GGUF container parsing (streaming and memory-mapped).
#[cfg(feature = "gguf")]
pub use smallmind_gguf as gguf;

/// The private SMQ mirror container: reading and writing.
#[cfg(feature = "smq")]
pub use smallmind_smq as smq;

/// GGUF -> SMQ conversion, carrying forward architecture and tokenizer
/// metadata.
#[cfg(feature = "import")]
pub use smallmind_import as import;

/// Byte-pair-encoding tokenization, including GGUF-embedded vocabularies.
#[cfg(feature = "tokenizer")]
pub use smallmind_tokenizer as tokenizer;

/// Content-addressed local cache for registered model files.
#[cfg(feature = "cache")]
pub use smallmind_cache as cache;
