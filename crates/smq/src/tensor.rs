//! A named, typed tensor as stored in (or about to be written to) an SMQ
//! container.

use smallmind_quant::{ElementKind, QuantError};

/// One tensor's identity and encoded payload.
///
/// Unlike the GGUF reader's [`smallmind_gguf::TensorInfo`] (whose byte
/// layout is always the foreign block size baked into `ElementKind`), an
/// SMQ tensor carries its own `block_size` explicitly: the importer
/// re-quantizes `Q8_0`/`Q4_0` tensors to the private block size (default
/// 64, \S4.2's re-quantization contract) while every other supported kind
/// keeps its native block size.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedTensor {
    name: String,
    kind: ElementKind,
    dims: Vec<u64>,
    block_size: usize,
    bytes: Vec<u8>,
}

impl TypedTensor {
    /// Builds a tensor from its already-encoded bytes. `block_size` must
    /// match the layout `bytes` was produced with; see
    /// [`smallmind_quant::bytes_per_block_for`].
    pub fn new(name: impl Into<String>, kind: ElementKind, dims: Vec<u64>, block_size: usize, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind,
            dims,
            block_size,
            bytes,
        }
    }

    /// The tensor's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tensor's element kind.
    pub fn element_kind(&self) -> ElementKind {
        self.kind
    }

    /// Declared dimensions, outermost-first.
    pub fn dims(&self) -> &[u64] {
        &self.dims
    }

    /// Total element count.
    pub fn element_count(&self) -> u64 {
        self.dims.iter().product::<u64>().max(1)
    }

    /// The block size this tensor's bytes were encoded with.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// The tensor's raw encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Dequantizes this tensor to a float buffer.
    pub fn to_floats(&self) -> Result<Vec<f32>, QuantError> {
        let count = self.element_count() as usize;
        let mut out = vec![0f32; count];
        smallmind_quant::decode_with_block(self.kind, &self.bytes, count, &mut out, self.block_size)?;
        Ok(out)
    }
}
