//! K-quant super-block codecs: Q4_K and Q6_K.
//!
//! Both operate on 256-element super-blocks further divided into
//! finer-grained sub-blocks, each carrying its own scale (and, for Q4_K, its
//! own min). The bit-packing below follows the published ggml reference
//! layout; importers that do not need float values may instead copy the
//! raw block bytes verbatim (see `smallmind_import`), which this module's
//! byte-size constants make straightforward to validate.

use crate::QuantError;

/// Super-block element count shared by every K-quant scheme.
pub const Q4K_BLOCK_SIZE: usize = 256;
/// Encoded bytes per Q4_K super-block: 2 (d) + 2 (dmin) + 12 (packed
/// 6-bit scales/mins) + 128 (4-bit quants).
pub const Q4K_BYTES_PER_BLOCK: usize = 2 + 2 + 12 + 128;

/// Super-block element count shared by every K-quant scheme.
pub const Q6K_BLOCK_SIZE: usize = 256;
/// Encoded bytes per Q6_K super-block: 128 (low 4 bits) + 64 (high 2 bits)
/// + 16 (i8 sub-block scales) + 2 (d).
pub const Q6K_BYTES_PER_BLOCK: usize = 128 + 64 + 16 + 2;

/// Unpacks the 12-byte Q4_K `scales` field into one (scale, min) pair of
/// 6-bit values for sub-block `j` (`j` in `0..8`).
fn get_scale_min_k4(j: usize, q: &[u8]) -> (u8, u8) {
    if j < 4 {
        (q[j] & 63, q[j + 4] & 63)
    } else {
        (
            (q[j + 4] & 0x0F) | ((q[j - 4] >> 6) << 4),
            (q[j + 4] >> 4) | ((q[j] >> 6) << 4),
        )
    }
}

pub(crate) fn decode_q4_k(bytes: &[u8], count: usize, out: &mut [f32]) -> Result<(), QuantError> {
    let mut elem = 0usize;
    let mut offset = 0usize;
    while elem < count {
        let block = &bytes[offset..offset + Q4K_BYTES_PER_BLOCK];
        let d = smallmind_fp16::half_to_float(u16::from_le_bytes([block[0], block[1]]));
        let dmin = smallmind_fp16::half_to_float(u16::from_le_bytes([block[2], block[3]]));
        let scales = &block[4..16];
        let qs = &block[16..16 + 128];

        let mut y = [0f32; Q4K_BLOCK_SIZE];
        let mut q_off = 0usize;
        let mut y_off = 0usize;
        for j in 0..4 {
            let (sc1, m1) = get_scale_min_k4(2 * j, scales);
            let (sc2, m2) = get_scale_min_k4(2 * j + 1, scales);
            let d1 = d * sc1 as f32;
            let min1 = dmin * m1 as f32;
            let d2 = d * sc2 as f32;
            let min2 = dmin * m2 as f32;
            for l in 0..32 {
                y[y_off + l] = d1 * (qs[q_off + l] & 0x0F) as f32 - min1;
            }
            for l in 0..32 {
                y[y_off + 32 + l] = d2 * (qs[q_off + l] >> 4) as f32 - min2;
            }
            q_off += 32;
            y_off += 64;
        }

        let this_block_len = Q4K_BLOCK_SIZE.min(count - elem);
        out[elem..elem + this_block_len].copy_from_slice(&y[..this_block_len]);
        elem += this_block_len;
        offset += Q4K_BYTES_PER_BLOCK;
    }
    Ok(())
}

pub(crate) fn decode_q6_k(bytes: &[u8], count: usize, out: &mut [f32]) -> Result<(), QuantError> {
    let mut elem = 0usize;
    let mut offset = 0usize;
    while elem < count {
        let block = &bytes[offset..offset + Q6K_BYTES_PER_BLOCK];
        let ql = &block[0..128];
        let qh = &block[128..128 + 64];
        let sc = &block[192..192 + 16];
        let d = smallmind_fp16::half_to_float(u16::from_le_bytes([block[208], block[209]]));

        let mut y = [0f32; Q6K_BLOCK_SIZE];
        let mut ql_off = 0usize;
        let mut qh_off = 0usize;
        let mut sc_off = 0usize;
        let mut y_off = 0usize;
        for _ in 0..2 {
            for l in 0..32 {
                let is = l / 16;
                let high = qh[qh_off + l];
                let q1 = ((ql[ql_off + l] & 0x0F) | ((high & 3) << 4)) as i32 - 32;
                let q2 = ((ql[ql_off + l + 32] & 0x0F) | (((high >> 2) & 3) << 4)) as i32 - 32;
                let q3 = ((ql[ql_off + l] >> 4) | (((high >> 4) & 3) << 4)) as i32 - 32;
                let q4 = ((ql[ql_off + l + 32] >> 4) | (((high >> 6) & 3) << 4)) as i32 - 32;
                let s1 = sc[sc_off + is] as i8 as f32;
                let s2 = sc[sc_off + is + 2] as i8 as f32;
                let s3 = sc[sc_off + is + 4] as i8 as f32;
                let s4 = sc[sc_off + is + 6] as i8 as f32;
                y[y_off + l] = d * s1 * q1 as f32;
                y[y_off + l + 32] = d * s2 * q2 as f32;
                y[y_off + l + 64] = d * s3 * q3 as f32;
                y[y_off + l + 96] = d * s4 * q4 as f32;
            }
            y_off += 128;
            ql_off += 64;
            qh_off += 32;
            sc_off += 8;
        }

        let this_block_len = Q6K_BLOCK_SIZE.min(count - elem);
        out[elem..elem + this_block_len].copy_from_slice(&y[..this_block_len]);
        elem += this_block_len;
        offset += Q6K_BYTES_PER_BLOCK;
    }
    Ok(())
}
