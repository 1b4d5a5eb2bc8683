//! Plaintext reference computations for every pipeline stage.
//!
//! These mirror, in the clear, exactly what the secure pipeline computes in
//! shares; tests reconstruct stage outputs and compare against them.

use itertools::izip;
use sagg_util::hamming_weight;

/// Stage-1 reference: per (user, coordinate), `reference ⊕ client ⊕ 1`,
/// with the length-`dim` reference vector replicated across users.
pub fn expected_agreement(
    reference: &[u8],
    clients: &[u8],
    num_users: usize,
    dim: usize,
) -> Vec<u8> {
    assert_eq!(reference.len(), dim);
    assert_eq!(clients.len(), num_users * dim);
    clients
        .chunks(dim)
        .flat_map(|row| izip!(reference, row).map(|(r, c)| r ^ c ^ 1))
        .collect()
}

/// Stage-2 reference: per user, the population count of its agreement
/// slice.
pub fn expected_scores(agreement: &[u8], num_users: usize, dim: usize) -> Vec<u64> {
    assert_eq!(agreement.len(), num_users * dim);
    agreement.chunks(dim).map(hamming_weight).collect()
}

/// Stage-3 reference: per user, `max(0, score - threshold)`.
pub fn expected_weights(scores: &[u64], threshold: u64) -> Vec<u64> {
    scores.iter().map(|&s| s.saturating_sub(threshold)).collect()
}

/// Stage-4 reference: per coordinate, `Σ_user weight[user] *
/// client_bit[user][coordinate]`.
pub fn expected_aggregate(
    clients: &[u8],
    weights: &[u64],
    num_users: usize,
    dim: usize,
) -> Vec<u64> {
    assert_eq!(clients.len(), num_users * dim);
    assert_eq!(weights.len(), num_users);
    (0..dim)
        .map(|j| {
            (0..num_users)
                .map(|u| weights[u] * u64::from(clients[u * dim + j]))
                .sum()
        })
        .collect()
}

/// All four stages composed: the plaintext aggregate the pipeline must
/// reconstruct to.
pub fn expected_pipeline(
    reference: &[u8],
    clients: &[u8],
    num_users: usize,
    dim: usize,
    threshold: u64,
) -> Vec<u64> {
    let agreement = expected_agreement(reference, clients, num_users, dim);
    let scores = expected_scores(&agreement, num_users, dim);
    let weights = expected_weights(&scores, threshold);
    expected_aggregate(clients, &weights, num_users, dim)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The worked example: reference [1,0,1,0], one client identical (all
    // four coordinates agree) and one fully opposed (none agree), threshold
    // ratio 0.5 of four coordinates.
    #[test]
    fn worked_example() {
        let reference = [1, 0, 1, 0];
        let clients = [1, 0, 1, 0, 0, 1, 0, 1];

        let agreement = expected_agreement(&reference, &clients, 2, 4);
        assert_eq!(agreement, vec![1, 1, 1, 1, 0, 0, 0, 0]);

        let scores = expected_scores(&agreement, 2, 4);
        assert_eq!(scores, vec![4, 0]);

        let weights = expected_weights(&scores, 2);
        assert_eq!(weights, vec![2, 0]);

        let aggregate = expected_aggregate(&clients, &weights, 2, 4);
        assert_eq!(aggregate, vec![2, 0, 2, 0]);

        assert_eq!(
            expected_pipeline(&reference, &clients, 2, 4, 2),
            vec![2, 0, 2, 0]
        );
    }

    #[test]
    fn weights_saturate_at_zero() {
        assert_eq!(expected_weights(&[0, 2, 3, 9], 3), vec![0, 0, 0, 6]);
    }
}
