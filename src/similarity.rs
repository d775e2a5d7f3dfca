//! Cosine similarity ranking over product embeddings.

use serde::Serialize;

/// A ranked candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Match {
    /// Position of the candidate in the input slice
    pub index: usize,
    /// Cosine similarity to the query
    pub score: f32,
}

/// Cosine similarity in `[-1, 1]`. Mismatched lengths or a zero vector yield 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0) as f32
}

/// Ranks candidates by similarity to `query`, best first.
///
/// Candidates without an embedding are skipped. Equal scores keep their
/// input order. At most `top_n` matches are returned.
pub fn rank<'a, I>(query: &[f32], candidates: I, top_n: usize) -> Vec<Match>
where
    I: IntoIterator<Item = Option<&'a [f32]>>,
{
    let mut matches: Vec<Match> = candidates
        .into_iter()
        .enumerate()
        .filter_map(|(index, embedding)| {
            embedding.map(|e| Match { index, score: cosine_similarity(query, e) })
        })
        .collect();

    // sort_by is stable
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches.truncate(top_n);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_cosine_basic() {
        assert!(approx(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0));
        assert!(approx(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0));
        assert!(approx(cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]), -1.0));
        assert!(approx(cosine_similarity(&[3.0, 4.0], &[6.0, 8.0]), 1.0));
    }

    #[test]
    fn test_cosine_degenerate() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_rank_query_equal_to_candidate_first() {
        let candidates: Vec<Vec<f32>> =
            vec![vec![0.0, 1.0, 0.0], vec![0.2, 0.1, 0.9], vec![0.6, 0.8, 0.0]];

        let matches = rank(&candidates[1], candidates.iter().map(|c| Some(c.as_slice())), 3);

        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].index, 1);
        assert!(approx(matches[0].score, 1.0));
        assert!(matches[0].score >= matches[1].score);
        assert!(matches[1].score >= matches[2].score);
    }

    #[test]
    fn test_rank_ties_keep_input_order() {
        let a = [1.0f32, 0.0];
        let candidates = [Some(&a[..]), Some(&a[..]), Some(&a[..])];

        let matches = rank(&a, candidates, 2);

        assert_eq!(matches.iter().map(|m| m.index).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_rank_skips_missing_embeddings() {
        let a = [1.0f32, 0.0];
        let b = [0.0f32, 1.0];
        let candidates = [None, Some(&b[..]), None, Some(&a[..])];

        let matches = rank(&a, candidates, 10);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].index, 3);
        assert_eq!(matches[1].index, 1);
    }

    #[test]
    fn test_rank_empty() {
        let none: Vec<Option<&[f32]>> = Vec::new();
        assert!(rank(&[1.0, 0.0], none, 5).is_empty());

        let a = [1.0f32];
        assert!(rank(&a, [Some(&a[..])], 0).is_empty());
    }
}
