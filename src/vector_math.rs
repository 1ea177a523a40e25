use std::cmp::Ordering;

use ndarray::{Array1, ArrayView1};

/// Cosine similarity; 0.0 for empty, mismatched or zero-norm vectors.
///
/// Accumulates in f64 so tiny or huge components keep their direction.
pub fn cosine_similarity(query: &[f32], candidate: &[f32]) -> f32 {
    if query.is_empty() || query.len() != candidate.len() {
        return 0.0;
    }

    let query = widen(query);
    let candidate = widen(candidate);

    let query_norm = l2_norm(&query);
    let candidate_norm = l2_norm(&candidate);
    if query_norm == 0.0 || candidate_norm == 0.0 {
        return 0.0;
    }

    let score = query.dot(&candidate) / query_norm / candidate_norm;
    if score.is_finite() {
        score.clamp(-1.0, 1.0) as f32
    } else {
        0.0
    }
}

/// Indices of `candidates` with their scores, best first.
pub fn rank_descending_by_cosine(query: &[f32], candidates: &[Vec<f32>]) -> Vec<(usize, f32)> {
    let mut scores: Vec<(usize, f32)> = candidates
        .iter()
        .enumerate()
        .map(|(idx, candidate)| (idx, cosine_similarity(query, candidate)))
        .collect();

    scores.sort_by(|left, right| right.1.partial_cmp(&left.1).unwrap_or(Ordering::Equal));
    scores
}

fn widen(vector: &[f32]) -> Array1<f64> {
    ArrayView1::from(vector).mapv(f64::from)
}

fn l2_norm(vector: &Array1<f64>) -> f64 {
    vector.dot(vector).sqrt()
}
