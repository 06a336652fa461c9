//! Q8_0: per-block fp16 scale, 8-bit signed residuals.
//!
//! Layout for a block of `block_size` elements: 2 bytes (fp16 scale)
//! followed by `block_size` bytes of `i8`. `x_i = i8_i * scale`.

use crate::QuantError;

/// Bytes per block at the foreign (block 32) size; the private container
/// may use a different `block_size` via [`bytes_per_block`].
pub const BYTES_PER_BLOCK: usize = 2 + 32;

/// Encoded byte length of one block holding `block_size` elements.
pub fn bytes_per_block(block_size: usize) -> usize {
    2 + block_size
}

pub(crate) fn decode(
    bytes: &[u8],
    count: usize,
    out: &mut [f32],
    block_size: usize,
) -> Result<(), QuantError> {
    let bpb = bytes_per_block(block_size);
    let mut elem = 0usize;
    let mut offset = 0usize;
    while elem < count {
        let this_block_len = block_size.min(count - elem);
        let block = &bytes[offset..offset + bpb];
        let scale = smallmind_fp16::half_to_float(u16::from_le_bytes([block[0], block[1]]));
        for i in 0..this_block_len {
            let residual = block[2 + i] as i8;
            out[elem + i] = residual as f32 * scale;
        }
        elem += this_block_len;
        offset += bpb;
    }
    Ok(())
}

/// Quantizes `values` into Q8_0 blocks of `block_size` elements, appending
/// the result to `out`. The scale per block is `max(|values|) / 127`.
pub fn encode(values: &[f32], block_size: usize, out: &mut Vec<u8>) {
    for chunk in values.chunks(block_size) {
        let max_abs = chunk.iter().fold(0f32, |acc, v| acc.max(v.abs()));
        let scale = if max_abs == 0.0 { 0.0 } else { max_abs / 127.0 };
        let inv_scale = if scale == 0.0 { 0.0 } else { 1.0 / scale };

        out.extend_from_slice(&smallmind_fp16::float_to_half(scale).to_le_bytes());
        for &v in chunk {
            let q = (v * inv_scale).round().clamp(-128.0, 127.0) as i8;
            out.push(q as u8);
        }
        // Pad a trailing partial block with zeroed residuals so the byte
        // layout stays a fixed `2 + block_size` even for the last block.
        for _ in chunk.len()..block_size {
            out.push(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_known_block() {
        // scale = 1.0, residuals 0..31
        let mut bytes = smallmind_fp16::float_to_half(1.0).to_le_bytes().to_vec();
        for i in 0..32u8 {
            bytes.push(i);
        }
        let mut out = [0f32; 32];
        decode(&bytes, 32, &mut out, 32).unwrap();
        for i in 0..32 {
            assert_eq!(out[i], i as f32);
        }
    }

    #[test]
    fn encode_decode_near_idempotent() {
        let values: Vec<f32> = (0..64).map(|i| (i as f32 - 32.0) * 0.3).collect();
        let max_abs = values.iter().fold(0f32, |acc, v| acc.max(v.abs()));
        let mut bytes = Vec::new();
        encode(&values, 32, &mut bytes);
        let mut out = vec![0f32; 64];
        decode(&bytes, 64, &mut out, 32).unwrap();
        let bound = 2.0 * (max_abs / 127.0) + 1e-6;
        for (a, b) in values.iter().zip(out.iter()) {
            assert!((a - b).abs() <= bound);
        }
    }
}
