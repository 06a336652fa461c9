//! The BPE merge loop shared by plain and byte-level tokenization (\S4.6).

use crate::vocab::MergeTable;

/// Runs the merge loop over one pre-token's initial symbol sequence until
/// no rankable adjacent pair remains or only one symbol is left.
///
/// Each round scans left-to-right for the globally lowest-rank adjacent
/// pair (ties broken by leftmost position, which falls out of scanning in
/// order and only replacing a strictly lower rank), then replaces *every*
/// occurrence of that exact pair in a single forward pass into a fresh
/// buffer — never all pairs of the same shape found at once across
/// rounds, and never an in-place shuffle, per the two-buffer forward-pass
/// requirement.
pub fn merge(symbols: Vec<String>, merges: &MergeTable) -> Vec<String> {
    let mut current = symbols;
    loop {
        if current.len() < 2 {
            break;
        }

        let mut best_rank = u32::MAX;
        let mut best_pair: Option<(usize, usize)> = None;
        for i in 0..current.len() - 1 {
            if let Some(rank) = merges.rank(&current[i], &current[i + 1]) {
                if rank < best_rank {
                    best_rank = rank;
                    best_pair = Some((i, i + 1));
                }
            }
        }

        let Some((li, ri)) = best_pair else {
            break;
        };
        let left = current[li].clone();
        let right = current[ri].clone();

        let mut next = Vec::with_capacity(current.len());
        let mut i = 0;
        while i < current.len() {
            if i + 1 < current.len() && current[i] == left && current[i + 1] == right {
                let mut merged = current[i].clone();
                merged.push_str(&current[i + 1]);
                next.push(merged);
                i += 2;
            } else {
                next.push(current[i].clone());
                i += 1;
            }
        }
        current = next;
    }
    current
}
