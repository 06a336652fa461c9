//! Tensor identity and the declaration-ordered manifest.

use smallmind_quant::ElementKind;

/// One tensor's identity: name, element kind, dimensions, and its position
/// in the data section.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorInfo {
    name: String,
    kind: ElementKind,
    dims: Vec<u64>,
    /// Absolute byte offset from the start of the file, computed
    /// deterministically from declaration order (\S4.3 step 8), not the
    /// relative offset stored in the file (which may disagree and is
    /// ignored).
    absolute_offset: u64,
    encoded_byte_len: u64,
}

impl TensorInfo {
    pub(crate) fn new(name: String, kind: ElementKind, dims: Vec<u64>, absolute_offset: u64) -> Self {
        let count = dims.iter().product::<u64>().max(1);
        let encoded_byte_len = kind.byte_size(count);
        Self {
            name,
            kind,
            dims,
            absolute_offset,
            encoded_byte_len,
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

    /// Raw declared dimensions, outermost-first, as stored in the file.
    pub fn dims(&self) -> &[u64] {
        &self.dims
    }

    /// Total element count (product of all dimensions; `1` for a
    /// zero-rank/empty declaration, matching an implicit scalar).
    pub fn element_count(&self) -> u64 {
        self.dims.iter().product::<u64>().max(1)
    }

    /// Normalizes rank to `(rows, cols)`: a 1-D tensor is `(1, N)`, a 2-D
    /// tensor is `(rows, cols)` as declared, and higher ranks flatten to
    /// `(first_dim, product_of_rest)`, per \S3's Tensor identity note.
    pub fn normalized_shape(&self) -> (u64, u64) {
        match self.dims.len() {
            0 => (1, 1),
            1 => (1, self.dims[0]),
            2 => (self.dims[0], self.dims[1]),
            _ => {
                let rest: u64 = self.dims[1..].iter().product();
                (self.dims[0], rest)
            }
        }
    }

    /// Absolute byte offset of this tensor's data within the file.
    pub fn absolute_offset(&self) -> u64 {
        self.absolute_offset
    }

    /// Encoded byte length, per [`ElementKind::byte_size`].
    pub fn encoded_byte_len(&self) -> u64 {
        self.encoded_byte_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_shape_flattens_higher_ranks() {
        let t = TensorInfo::new("w".into(), ElementKind::F32, vec![4, 4, 4], 0);
        assert_eq!(t.normalized_shape(), (4, 16));
    }

    #[test]
    fn normalized_shape_1d() {
        let t = TensorInfo::new("w".into(), ElementKind::F32, vec![10], 0);
        assert_eq!(t.normalized_shape(), (1, 10));
    }
}
