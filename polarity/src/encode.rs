//! Multi-hot encoding of token sequences.
//!
//! A review is a variable-length list of token ids. The network wants a
//! fixed-width vector, so each review becomes an indicator vector of length
//! `dimension`: position `k` is `1.0` when token `k` occurs anywhere in the
//! review. Counts and order are discarded.
//!
//! [`MultiHot`] keeps only the set positions of every row. The full IMDB
//! training split is 25000 x 10000, which is 2GB as dense `f64`, so the
//! trainer densifies one mini-batch at a time through [`Inputs::gather`].

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What to do with a token id that does not fit in the vector.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutOfRange {
    #[default]
    Reject,
    Ignore,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MultiHot {
    dimension: usize,
    rows: Vec<Vec<u32>>,
}

impl MultiHot {
    /// Encodes every sequence into its sorted set of distinct token ids.
    ///
    /// Fails with [`Error::TokenOutOfRange`] on the first token `>= dimension`
    /// unless `policy` is [`OutOfRange::Ignore`].
    pub fn encode<S: AsRef<[u32]>>(
        sequences: &[S],
        dimension: usize,
        policy: OutOfRange,
    ) -> Result<MultiHot> {
        let mut rows = Vec::with_capacity(sequences.len());

        for (i, sequence) in sequences.iter().enumerate() {
            let mut row = Vec::with_capacity(sequence.as_ref().len());
            for &token in sequence.as_ref() {
                if token as usize >= dimension {
                    match policy {
                        OutOfRange::Reject => {
                            return Err(Error::TokenOutOfRange {
                                sequence: i,
                                token,
                                dimension,
                            })
                        }
                        OutOfRange::Ignore => continue,
                    }
                }
                row.push(token);
            }
            row.sort_unstable();
            row.dedup();
            rows.push(row);
        }

        Ok(MultiHot { dimension, rows })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Positions set to `1.0` in row `i`, ascending.
    pub fn row(&self, i: usize) -> &[u32] {
        &self.rows[i]
    }

    pub fn to_dense(&self) -> Array2<f64> {
        let all = (0..self.rows.len()).collect::<Vec<usize>>();
        self.gather(&all)
    }

    /// Splits off the first `n` rows, returning `(head, tail)`.
    pub fn split_at(&self, n: usize) -> (MultiHot, MultiHot) {
        let n = n.min(self.rows.len());
        let (head, tail) = self.rows.split_at(n);
        (
            MultiHot {
                dimension: self.dimension,
                rows: head.to_vec(),
            },
            MultiHot {
                dimension: self.dimension,
                rows: tail.to_vec(),
            },
        )
    }
}

/// Dense multi-hot matrix, one row per sequence.
pub fn vectorize_sequences<S: AsRef<[u32]>>(
    sequences: &[S],
    dimension: usize,
) -> Result<Array2<f64>> {
    Ok(MultiHot::encode(sequences, dimension, OutOfRange::Reject)?.to_dense())
}

/// Labels as an `(n, 1)` column of `0.0` / `1.0`.
pub fn vectorize_labels(labels: &[u8]) -> Array2<f64> {
    labels
        .iter()
        .map(|l| *l as f64)
        .collect::<Array1<f64>>()
        .insert_axis(Axis(1))
}

/// Row-addressable model input.
pub trait Inputs {
    fn samples(&self) -> usize;
    fn features(&self) -> usize;
    /// Dense `(rows.len(), features)` batch in the given row order.
    fn gather(&self, rows: &[usize]) -> Array2<f64>;
}

impl Inputs for MultiHot {
    fn samples(&self) -> usize {
        self.rows.len()
    }

    fn features(&self) -> usize {
        self.dimension
    }

    fn gather(&self, rows: &[usize]) -> Array2<f64> {
        let mut batch = Array2::zeros((rows.len(), self.dimension));
        for (b, &r) in rows.iter().enumerate() {
            for &token in self.rows[r].iter() {
                batch[[b, token as usize]] = 1.;
            }
        }
        batch
    }
}

impl Inputs for Array2<f64> {
    fn samples(&self) -> usize {
        self.nrows()
    }

    fn features(&self) -> usize {
        self.ncols()
    }

    fn gather(&self, rows: &[usize]) -> Array2<f64> {
        self.select(Axis(0), rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_positions(row: ndarray::ArrayView1<f64>) -> Vec<u32> {
        row.iter()
            .enumerate()
            .filter(|(_, v)| **v == 1.)
            .map(|(i, _)| i as u32)
            .collect()
    }

    #[test]
    fn marks_membership_not_counts() {
        let x = vectorize_sequences(&[vec![3u32, 1, 3, 3, 7]], 10).unwrap();
        assert_eq!(x.shape(), &[1, 10]);
        assert_eq!(set_positions(x.row(0)), vec![1, 3, 7]);
        assert_eq!(x.sum(), 3.);
    }

    #[test]
    fn empty_sequence_is_all_zero() {
        let empty: Vec<u32> = vec![];
        let x = vectorize_sequences(&[empty], 5).unwrap();
        assert!(x.iter().all(|v| *v == 0.));
    }

    #[test]
    fn deduplicated_and_reordered_sequences_encode_identically() {
        let a = vectorize_sequences(&[vec![9u32, 2, 2, 4, 9]], 12).unwrap();
        let b = vectorize_sequences(&[vec![4u32, 9, 2]], 12).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_token_at_dimension() {
        let err = vectorize_sequences(&[vec![0u32, 1], vec![2, 5]], 5).unwrap_err();
        match err {
            Error::TokenOutOfRange {
                sequence,
                token,
                dimension,
            } => {
                assert_eq!((sequence, token, dimension), (1, 5, 5));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn ignore_policy_drops_out_of_range_tokens() {
        let m = MultiHot::encode(&[vec![1u32, 50, 2]], 4, OutOfRange::Ignore).unwrap();
        assert_eq!(m.row(0), &[1, 2]);
    }

    #[test]
    fn sparse_gather_matches_dense() {
        let seqs: Vec<Vec<u32>> = vec![vec![0, 4], vec![], vec![2, 2, 3]];
        let m = MultiHot::encode(&seqs, 5, OutOfRange::Reject).unwrap();
        let dense = m.to_dense();

        let batch = m.gather(&[2, 0]);
        assert_eq!(batch.row(0), dense.row(2));
        assert_eq!(batch.row(1), dense.row(0));
        assert_eq!(dense.gather(&[2, 0]), batch);
    }

    #[test]
    fn split_keeps_order() {
        let seqs: Vec<Vec<u32>> = vec![vec![1], vec![2], vec![3]];
        let m = MultiHot::encode(&seqs, 4, OutOfRange::Reject).unwrap();
        let (head, tail) = m.split_at(1);
        assert_eq!(head.len(), 1);
        assert_eq!(tail.row(0), &[2]);
        assert_eq!(tail.dimension(), 4);
    }

    #[test]
    fn labels_become_a_column() {
        let y = vectorize_labels(&[1, 0, 1]);
        assert_eq!(y.shape(), &[3, 1]);
        assert_eq!(y[[2, 0]], 1.);
    }
}
