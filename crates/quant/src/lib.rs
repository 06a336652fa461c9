//! Block-wise quantization codecs.
//!
//! Each scheme below is a closed, self-contained little-endian byte layout.
//! `ElementKind` is the full set the GGUF reader can *recognize*; only a
//! subset (`ElementKind::is_decodable`) can be turned into floats or
//! re-quantized by this crate — the rest (`Q5_1`, `Q8_1`, the legacy
//! `Q2_K..Q8_K` and `IQ*` families) are sized correctly so a reader can
//! still walk past their tensor data, but their bits are opaque here.
#![deny(missing_docs)]

mod k_quant;
mod q4_0;
mod q4_1;
mod q5_0;
mod q8_0;

pub use k_quant::{Q4K_BLOCK_SIZE, Q4K_BYTES_PER_BLOCK, Q6K_BLOCK_SIZE, Q6K_BYTES_PER_BLOCK};

/// Block size the importer re-quantizes `Q8_0`/`Q4_0` tensors to when
/// converting GGUF into the private SMQ container (\S4.2's re-quantization
/// contract). Every other decodable kind keeps its native block size.
pub const DEFAULT_PRIVATE_BLOCK_SIZE: usize = 64;

/// The full closed set of tensor element kinds the GGUF format can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// 32-bit IEEE-754 float, raw.
    F32,
    /// 16-bit IEEE-754 half float, raw (decoded via [`smallmind_fp16`]).
    F16,
    /// 4-bit, block 32, single fp16 scale.
    Q4_0,
    /// 4-bit, block 32, fp16 scale + fp16 min.
    Q4_1,
    /// 5-bit, block 32, single fp16 scale.
    Q5_0,
    /// Block 32, single fp16 scale, fp16 min. Recognized, not decoded.
    Q5_1,
    /// 8-bit, block 32, single fp16 scale.
    Q8_0,
    /// Block 32. Recognized, not decoded.
    Q8_1,
    /// K-quant super-block (256), 2-bit. Recognized, not decoded.
    Q2K,
    /// K-quant super-block (256), 3-bit. Recognized, not decoded.
    Q3K,
    /// K-quant super-block (256), 4-bit.
    Q4K,
    /// K-quant super-block (256), 5-bit. Recognized, not decoded.
    Q5K,
    /// K-quant super-block (256), 6-bit.
    Q6K,
    /// K-quant super-block (256), 8-bit. Recognized, not decoded.
    Q8K,
    /// Importance-matrix quant variant. Recognized, not decoded.
    Iq2Xxs,
    /// Importance-matrix quant variant. Recognized, not decoded.
    Iq2Xs,
    /// Importance-matrix quant variant. Recognized, not decoded.
    Iq3Xxs,
    /// Importance-matrix quant variant. Recognized, not decoded.
    Iq1S,
    /// Importance-matrix quant variant. Recognized, not decoded.
    Iq4Nl,
    /// Importance-matrix quant variant. Recognized, not decoded.
    Iq3S,
    /// Importance-matrix quant variant. Recognized, not decoded.
    Iq2S,
    /// Importance-matrix quant variant. Recognized, not decoded.
    Iq4Xs,
}

impl ElementKind {
    /// Maps from the GGUF wire-format tensor-kind integer.
    pub fn from_ggml_u32(value: u32) -> Option<Self> {
        use ElementKind::*;
        Some(match value {
            0 => F32,
            1 => F16,
            2 => Q4_0,
            3 => Q4_1,
            6 => Q5_0,
            7 => Q5_1,
            8 => Q8_0,
            9 => Q8_1,
            10 => Q2K,
            11 => Q3K,
            12 => Q4K,
            13 => Q5K,
            14 => Q6K,
            15 => Q8K,
            16 => Iq2Xxs,
            17 => Iq2Xs,
            18 => Iq3Xxs,
            19 => Iq1S,
            20 => Iq4Nl,
            21 => Iq3S,
            22 => Iq2S,
            23 => Iq4Xs,
            _ => return None,
        })
    }

    /// The GGUF wire-format tensor-kind integer for this kind.
    pub fn to_ggml_u32(self) -> u32 {
        use ElementKind::*;
        match self {
            F32 => 0,
            F16 => 1,
            Q4_0 => 2,
            Q4_1 => 3,
            Q5_0 => 6,
            Q5_1 => 7,
            Q8_0 => 8,
            Q8_1 => 9,
            Q2K => 10,
            Q3K => 11,
            Q4K => 12,
            Q5K => 13,
            Q6K => 14,
            Q8K => 15,
            Iq2Xxs => 16,
            Iq2Xs => 17,
            Iq3Xxs => 18,
            Iq1S => 19,
            Iq4Nl => 20,
            Iq3S => 21,
            Iq2S => 22,
            Iq4Xs => 23,
        }
    }

    /// The element-count divisor for this kind's block layout. `1` for the
    /// unblocked float kinds.
    pub fn block_size(self) -> usize {
        use ElementKind::*;
        match self {
            F32 | F16 => 1,
            Q4_0 | Q4_1 | Q5_0 | Q5_1 | Q8_0 | Q8_1 => 32,
            Q2K | Q3K | Q4K | Q5K | Q6K | Q8K => 256,
            Iq2Xxs | Iq2Xs | Iq3Xxs | Iq1S | Iq4Nl | Iq3S | Iq2S | Iq4Xs => 256,
        }
    }

    /// Encoded byte size of one block (or one element, for `F32`/`F16`).
    pub fn bytes_per_block(self) -> usize {
        use ElementKind::*;
        match self {
            F32 => 4,
            F16 => 2,
            Q4_0 => q4_0::BYTES_PER_BLOCK,
            Q4_1 => q4_1::BYTES_PER_BLOCK,
            Q5_0 => q5_0::BYTES_PER_BLOCK,
            Q5_1 => 2 + 2 + 32,
            Q8_0 => q8_0::BYTES_PER_BLOCK,
            Q8_1 => 2 + 2 + 32,
            Q2K => 84,
            Q3K => 110,
            Q4K => k_quant::Q4K_BYTES_PER_BLOCK,
            Q5K => 176,
            Q6K => k_quant::Q6K_BYTES_PER_BLOCK,
            Q8K => 292,
            // IQ* sizes vary; these are the published ggml byte widths for a
            // 256-element super-block, kept here purely for manifest sizing.
            Iq2Xxs => 66,
            Iq2Xs => 74,
            Iq3Xxs => 98,
            Iq1S => 50,
            Iq4Nl => 128 + 2,
            Iq3S => 110,
            Iq2S => 82,
            Iq4Xs => 136,
        }
    }

    /// Total encoded byte length for `count` elements of this kind.
    ///
    /// For block-wise kinds this is `ceil(count / block_size) * bytes_per_block`;
    /// trailing partial blocks are permitted for the legacy (block-32)
    /// schemes but rejected for K-quants by [`ElementKind::validate_count`].
    pub fn byte_size(self, count: u64) -> u64 {
        if self.block_size() == 1 {
            return count * self.bytes_per_block() as u64;
        }
        let block_size = self.block_size() as u64;
        let blocks = (count + block_size - 1) / block_size;
        blocks * self.bytes_per_block() as u64
    }

    /// Whether this crate can decode this kind to floats / re-quantize it.
    pub fn is_decodable(self) -> bool {
        use ElementKind::*;
        matches!(self, F32 | F16 | Q4_0 | Q4_1 | Q5_0 | Q8_0 | Q4K | Q6K)
    }

    /// Whether a tensor of this kind must have `count % block_size == 0`.
    /// K-quants (256-wide super-blocks) require exact tiling; the legacy
    /// block-32 schemes tolerate a partial trailing block.
    pub fn requires_exact_blocks(self) -> bool {
        use ElementKind::*;
        matches!(self, Q2K | Q3K | Q4K | Q5K | Q6K | Q8K)
    }

    /// Validates `count` against [`ElementKind::requires_exact_blocks`].
    pub fn validate_count(self, count: u64) -> Result<(), QuantError> {
        if self.requires_exact_blocks() && self.block_size() > 0 {
            let block_size = self.block_size() as u64;
            if count % block_size != 0 {
                return Err(QuantError::MisalignedBlockCount {
                    kind: self,
                    count,
                    block_size: self.block_size(),
                });
            }
        }
        Ok(())
    }
}

/// Errors produced by the quantization codecs.
#[derive(Debug, thiserror::Error)]
pub enum QuantError {
    /// The tensor's element count is not a multiple of a K-quant's
    /// super-block size.
    #[error("element count {count} is not a multiple of block size {block_size} for {kind:?}")]
    MisalignedBlockCount {
        /// The offending kind.
        kind: ElementKind,
        /// The declared element count.
        count: u64,
        /// The required block size.
        block_size: usize,
    },
    /// A decode or encode call saw a byte buffer of the wrong length.
    #[error("byte buffer size mismatch: expected {expected}, got {actual}")]
    SizeMismatch {
        /// Expected byte length.
        expected: usize,
        /// Actual byte length.
        actual: usize,
    },
    /// Attempted to decode or encode a kind this crate does not support.
    #[error("unsupported element kind for decode/encode: {0:?}")]
    UnsupportedKind(ElementKind),
}

/// Dequantizes `bytes` (holding `count` elements of `kind`) into `out`,
/// which must have length `count`.
pub fn decode(kind: ElementKind, bytes: &[u8], count: usize, out: &mut [f32]) -> Result<(), QuantError> {
    if out.len() != count {
        return Err(QuantError::SizeMismatch {
            expected: count,
            actual: out.len(),
        });
    }
    let expected_bytes = kind.byte_size(count as u64) as usize;
    if bytes.len() != expected_bytes {
        return Err(QuantError::SizeMismatch {
            expected: expected_bytes,
            actual: bytes.len(),
        });
    }

    match kind {
        ElementKind::F32 => {
            for (i, chunk) in bytes.chunks_exact(4).enumerate() {
                out[i] = f32::from_le_bytes(chunk.try_into().unwrap());
            }
        }
        ElementKind::F16 => {
            for (i, chunk) in bytes.chunks_exact(2).enumerate() {
                let bits = u16::from_le_bytes(chunk.try_into().unwrap());
                out[i] = smallmind_fp16::half_to_float(bits);
            }
        }
        ElementKind::Q4_0 => q4_0::decode(bytes, count, out, 32)?,
        ElementKind::Q4_1 => q4_1::decode(bytes, count, out)?,
        ElementKind::Q5_0 => q5_0::decode(bytes, count, out)?,
        ElementKind::Q8_0 => q8_0::decode(bytes, count, out, 32)?,
        ElementKind::Q4K => k_quant::decode_q4_k(bytes, count, out)?,
        ElementKind::Q6K => k_quant::decode_q6_k(bytes, count, out)?,
        other => return Err(QuantError::UnsupportedKind(other)),
    }
    Ok(())
}

/// Quantizes `values` into Q8_0 blocks of `block_size` elements (the
/// private container's re-quantization target; `block_size` need not be 32).
pub fn encode_q8_0(values: &[f32], block_size: usize, out: &mut Vec<u8>) {
    q8_0::encode(values, block_size, out)
}

/// Quantizes `values` into Q4_0 blocks of `block_size` elements.
pub fn encode_q4_0(values: &[f32], block_size: usize, out: &mut Vec<u8>) {
    q4_0::encode(values, block_size, out)
}

/// Dequantizes foreign (block-32) Q8_0 bytes into a float buffer.
pub fn decode_q8_0_block32(bytes: &[u8], count: usize, out: &mut [f32]) -> Result<(), QuantError> {
    q8_0::decode(bytes, count, out, 32)
}

/// Dequantizes foreign (block-32) Q4_0 bytes into a float buffer.
pub fn decode_q4_0_block32(bytes: &[u8], count: usize, out: &mut [f32]) -> Result<(), QuantError> {
    q4_0::decode(bytes, count, out, 32)
}

/// Dequantizes Q8_0 bytes encoded at an arbitrary `block_size` (the private
/// container's re-quantization target need not be the foreign 32).
pub fn decode_q8_0(bytes: &[u8], count: usize, out: &mut [f32], block_size: usize) -> Result<(), QuantError> {
    q8_0::decode(bytes, count, out, block_size)
}

/// Dequantizes Q4_0 bytes encoded at an arbitrary `block_size`.
pub fn decode_q4_0(bytes: &[u8], count: usize, out: &mut [f32], block_size: usize) -> Result<(), QuantError> {
    q4_0::decode(bytes, count, out, block_size)
}

/// Encoded bytes-per-block for `kind` at a caller-chosen `block_size`.
///
/// Only `Q8_0`/`Q4_0` support a non-native block size (the private
/// container's re-quantization target, \S4.2); every other kind ignores
/// `block_size` and reports its own fixed [`ElementKind::bytes_per_block`].
pub fn bytes_per_block_for(kind: ElementKind, block_size: usize) -> usize {
    match kind {
        ElementKind::Q8_0 => q8_0::bytes_per_block(block_size),
        ElementKind::Q4_0 => q4_0::bytes_per_block(block_size),
        other => other.bytes_per_block(),
    }
}

/// Total encoded byte length for `count` elements of `kind` at a
/// caller-chosen `block_size`, per [`bytes_per_block_for`].
pub fn byte_size_for_block(kind: ElementKind, count: u64, block_size: usize) -> u64 {
    if block_size == 0 {
        return kind.byte_size(count);
    }
    let block_size = block_size as u64;
    let blocks = (count + block_size - 1) / block_size;
    blocks * bytes_per_block_for(kind, block_size as usize) as u64
}

/// Dequantizes `bytes` for `kind` at a caller-chosen `block_size`, falling
/// back to the fixed-block-size [`decode`] for kinds that don't support
/// re-blocking.
pub fn decode_with_block(
    kind: ElementKind,
    bytes: &[u8],
    count: usize,
    out: &mut [f32],
    block_size: usize,
) -> Result<(), QuantError> {
    match kind {
        ElementKind::Q8_0 => decode_q8_0(bytes, count, out, block_size),
        ElementKind::Q4_0 => decode_q4_0(bytes, count, out, block_size),
        _ => decode(kind, bytes, count, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_size_formulas() {
        assert_eq!(ElementKind::F32.byte_size(4), 16);
        assert_eq!(ElementKind::Q8_0.byte_size(32), 34);
        assert_eq!(ElementKind::Q4_0.byte_size(32), 18);
        assert_eq!(ElementKind::Q4_1.byte_size(32), 20);
        assert_eq!(ElementKind::Q5_0.byte_size(32), 22);
        assert_eq!(ElementKind::Q4K.byte_size(256), 144);
        assert_eq!(ElementKind::Q6K.byte_size(256), 210);
    }

    #[test]
    fn trailing_partial_block_allowed_for_legacy_quants() {
        // 40 elements at block 32: two blocks (one partial) -> 2*18 bytes.
        assert_eq!(ElementKind::Q4_0.byte_size(40), 36);
        assert!(ElementKind::Q4_0.validate_count(40).is_ok());
    }

    #[test]
    fn k_quant_requires_exact_blocks() {
        assert!(ElementKind::Q4K.validate_count(255).is_err());
        assert!(ElementKind::Q4K.validate_count(256).is_ok());
    }

    #[test]
    fn wire_kind_round_trip() {
        // Wire values 4 and 5 (the legacy, removed Q4_2/Q4_3 kinds) have no
        // `ElementKind` arm and correctly return `None` from
        // `from_ggml_u32`; skip them rather than `unwrap()`-panicking.
        for v in (0..=23u32).filter(|v| *v != 4 && *v != 5) {
            let kind = ElementKind::from_ggml_u32(v).unwrap();
            assert_eq!(kind.to_ggml_u32(), v);
        }
        assert!(ElementKind::from_ggml_u32(4).is_none());
        assert!(ElementKind::from_ggml_u32(5).is_none());
        assert!(ElementKind::from_ggml_u32(99).is_none());
    }

    #[test]
    fn byte_size_for_block_tracks_custom_block_size() {
        // Private re-quantization target (block 64) differs from the
        // foreign block-32 formula ElementKind::byte_size assumes.
        assert_eq!(byte_size_for_block(ElementKind::Q8_0, 64, 64), 2 + 64);
        assert_eq!(byte_size_for_block(ElementKind::Q4_0, 64, 64), 2 + 32);
        // Kinds that are never re-blocked ignore the parameter.
        assert_eq!(
            byte_size_for_block(ElementKind::Q4K, 256, 64),
            ElementKind::Q4K.byte_size(256)
        );
    }

    #[test]
    fn f32_decode_is_identity() {
        let values = [1.0f32, -2.5, 3.0, 4.0];
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut out = [0f32; 4];
        decode(ElementKind::F32, &bytes, 4, &mut out).unwrap();
        assert_eq!(out, values);
    }
}
