//! Error taxonomy for the GGUF -> SMQ importer.

use smallmind_gguf::GgufError;
use smallmind_quant::{ElementKind, QuantError};
use smallmind_smq::SmqError;

/// Errors raised while importing a GGUF file into an SMQ container.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// One or more tensors declared a kind this crate cannot decode.
    /// Always enumerates every offender (\S4.5 step 2: "never partial
    /// import") so a caller can act on the complete list after a single
    /// upgrade, rather than discovering them one at a time.
    #[error("{count} tensor(s) use an unsupported element kind: {kinds:?}", count = .0.len(), kinds = .0)]
    UnsupportedKindBatch(Vec<(String, ElementKind)>),
    /// Failure reading or parsing the source GGUF file.
    #[error(transparent)]
    Gguf(#[from] GgufError),
    /// Failure writing the destination SMQ container.
    #[error(transparent)]
    Smq(#[from] SmqError),
    /// Failure decoding or re-quantizing a tensor's bytes.
    #[error(transparent)]
    Quant(#[from] QuantError),
}
