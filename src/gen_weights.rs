use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Generate the weight vector where each vertex has the same weight.
pub fn gen_uniform_weights(no_of_vertices: usize) -> Vec<f64> {
    vec![1.0; no_of_vertices]
}

/// Generate the weight vector where each vertex has a random weight in
/// `[min_weight, max_weight)`. Projection weights must be positive.
pub fn gen_random_weights(
    no_of_vertices: usize,
    min_weight: f64,
    max_weight: f64,
    seed: Option<u64>,
) -> Vec<f64> {
    assert!(max_weight > min_weight, "Max weight must be greater than min weight.");
    assert!(min_weight > 0.0, "Weights must be positive.");

    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };

    (0..no_of_vertices)
        .map(|_| rng.gen_range(min_weight..max_weight))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gen_random_weights_in_range() {
        // Act
        let weights = gen_random_weights(1_000, 1.0, 3.0, Some(5));

        // Assert
        assert_eq!(weights.len(), 1_000);
        assert!(weights.iter().all(|&w| (1.0..3.0).contains(&w)));
    }

    #[test]
    fn test_gen_random_weights_is_seeded() {
        assert_eq!(gen_random_weights(10, 0.5, 2.0, Some(7)), gen_random_weights(10, 0.5, 2.0, Some(7)));
    }

    #[test]
    #[should_panic(expected = "positive")]
    fn test_gen_random_weights_rejects_zero() {
        gen_random_weights(3, 0.0, 1.0, None);
    }
}
