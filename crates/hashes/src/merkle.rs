//! Merkle root computation over double-SHA-256, with a batched pair kernel
//! behind a single dispatch seam.

use once_cell::sync::Lazy;

use crate::hash256::{hash256, hash256_pair, Hash256Digest, NULL_HASH};

/// A batched pair kernel: compresses adjacent digest pairs into their
/// double-SHA-256 parents. Input length must be even.
type PairKernel = fn(&[Hash256Digest]) -> Vec<Hash256Digest>;

/// The selected kernel. Vectorized kernels (SHA-NI, AVX2, NEON) hook in at
/// this seam behind their capability checks; each must agree bit-for-bit
/// with [`scalar_pairs`], which is authoritative.
static KERNEL: Lazy<PairKernel> = Lazy::new(select_kernel);

fn select_kernel() -> PairKernel {
    scalar_pairs
}

/// The authoritative scalar pair kernel.
fn scalar_pairs(digests: &[Hash256Digest]) -> Vec<Hash256Digest> {
    digests
        .chunks_exact(2)
        .map(|pair| hash256_pair(&pair[0], &pair[1]))
        .collect()
}

/// Hash adjacent digest pairs into their parents. The input length must be
/// even; a trailing unpaired digest is ignored.
pub fn hash256_pairs(digests: &[Hash256Digest]) -> Vec<Hash256Digest> {
    debug_assert!(digests.len() % 2 == 0, "pair kernel input must be even");
    (*KERNEL)(digests)
}

/// Two disjoint one-block double-SHA-256 hashes. Scalar here; the batched
/// form is the unit a two-lane vector kernel computes per dispatch.
pub fn hash256_x2(left: &[u8; 64], right: &[u8; 64]) -> [Hash256Digest; 2] {
    [hash256(left), hash256(right)]
}

/// Compute the Bitcoin merkle root of a list of digests.
///
/// Pairs adjacent digests left to right, duplicating the tail of an
/// odd-length round, and double-SHA-256 hashes each pair until one digest
/// remains. Empty input yields the null sentinel; a single digest is its
/// own root.
pub fn merkle_root(mut digests: Vec<Hash256Digest>) -> Hash256Digest {
    if digests.is_empty() {
        return NULL_HASH;
    }
    while digests.len() > 1 {
        if digests.len() % 2 == 1 {
            let tail = digests[digests.len() - 1];
            digests.push(tail);
        }
        digests = hash256_pairs(&digests);
    }
    digests[0]
}

#[cfg(test)]
mod test {
    use super::*;

    /// The reference recursion the kernelized version must match.
    fn naive_root(digests: &[Hash256Digest]) -> Hash256Digest {
        match digests.len() {
            0 => NULL_HASH,
            1 => digests[0],
            _ => {
                let mut level = digests.to_vec();
                if level.len() % 2 == 1 {
                    level.push(level[level.len() - 1]);
                }
                let parents: Vec<Hash256Digest> = level
                    .chunks_exact(2)
                    .map(|pair| {
                        let mut preimage = Vec::with_capacity(64);
                        preimage.extend_from_slice(&pair[0]);
                        preimage.extend_from_slice(&pair[1]);
                        hash256(&preimage)
                    })
                    .collect();
                naive_root(&parents)
            }
        }
    }

    fn leaf(fill: u8) -> Hash256Digest {
        [fill; 32]
    }

    #[test]
    fn it_handles_degenerate_sizes() {
        assert_eq!(merkle_root(vec![]), NULL_HASH);
        assert_eq!(merkle_root(vec![leaf(0xab)]), leaf(0xab));
    }

    #[test]
    fn it_pairs_two_four_and_eight_leaves() {
        let l: Vec<Hash256Digest> = (0u8..8).map(leaf).collect();

        assert_eq!(
            merkle_root(vec![l[0], l[1]]),
            hash256_pair(&l[0], &l[1])
        );

        let left = hash256_pair(&l[0], &l[1]);
        let right = hash256_pair(&l[2], &l[3]);
        assert_eq!(
            merkle_root(l[..4].to_vec()),
            hash256_pair(&left, &right)
        );

        let ll = hash256_pair(&left, &right);
        let rl = hash256_pair(
            &hash256_pair(&l[4], &l[5]),
            &hash256_pair(&l[6], &l[7]),
        );
        assert_eq!(merkle_root(l.clone()), hash256_pair(&ll, &rl));
    }

    #[test]
    fn it_duplicates_the_odd_tail() {
        let l: Vec<Hash256Digest> = (0u8..3).map(leaf).collect();
        let expected = hash256_pair(
            &hash256_pair(&l[0], &l[1]),
            &hash256_pair(&l[2], &l[2]),
        );
        assert_eq!(merkle_root(l), expected);
    }

    #[test]
    fn it_matches_the_naive_reference() {
        for size in 1usize..=33 {
            let digests: Vec<Hash256Digest> = (0..size as u8).map(leaf).collect();
            assert_eq!(merkle_root(digests.clone()), naive_root(&digests), "size {}", size);
        }
    }

    #[test]
    fn it_batches_disjoint_double_hashes() {
        let left = [0x11u8; 64];
        let right = [0x22u8; 64];
        assert_eq!(hash256_x2(&left, &right), [hash256(&left), hash256(&right)]);
    }
}
