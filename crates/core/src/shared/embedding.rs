use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    #[error("embedding is empty")]
    Empty,
    #[error("embedding contains non-finite values")]
    NonFinite,
    #[error("embedding has zero norm")]
    ZeroNorm,
}

/// Identity feature vector, always L2-normalized.
///
/// The dot product of two embeddings is their cosine similarity.
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Normalizes `values` to unit length.
    pub fn new(mut values: Vec<f32>) -> Result<Self, EmbeddingError> {
        if values.is_empty() {
            return Err(EmbeddingError::Empty);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(EmbeddingError::NonFinite);
        }
        if !l2_normalize(&mut values) {
            return Err(EmbeddingError::ZeroNorm);
        }
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn cosine_similarity(&self, other: &Embedding) -> f64 {
        dot(&self.0, &other.0)
    }

    pub fn cosine_distance(&self, other: &Embedding) -> f64 {
        1.0 - self.cosine_similarity(other)
    }

    /// Re-normalized mean of `members`; `None` for an empty set, mismatched
    /// dimensions, or vectors that cancel out.
    pub fn centroid<'a, I>(members: I) -> Option<Embedding>
    where
        I: IntoIterator<Item = &'a Embedding>,
    {
        let mut sum: Vec<f64> = Vec::new();
        for e in members {
            if sum.is_empty() {
                sum = vec![0.0; e.dim()];
            } else if sum.len() != e.dim() {
                return None;
            }
            for (acc, v) in sum.iter_mut().zip(e.as_slice()) {
                *acc += *v as f64;
            }
        }
        if sum.is_empty() {
            return None;
        }
        Embedding::new(sum.into_iter().map(|v| v as f32).collect()).ok()
    }
}

/// Scales `v` to unit length in place. Returns `false` for a zero vector,
/// which is left untouched.
pub fn l2_normalize(v: &mut [f32]) -> bool {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        for x in v.iter_mut() {
            *x /= norm;
        }
        true
    } else {
        false
    }
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_l2_normalize_unit_vector() {
        let mut v = vec![3.0, 4.0];
        assert!(l2_normalize(&mut v));
        assert_relative_eq!(v[0], 0.6, epsilon = 1e-6);
        assert_relative_eq!(v[1], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let mut v = vec![0.0, 0.0, 0.0];
        assert!(!l2_normalize(&mut v));
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_new_normalizes() {
        let e = Embedding::new(vec![0.0, 5.0]).unwrap();
        assert_eq!(e.as_slice(), &[0.0, 1.0]);
        assert_eq!(e.dim(), 2);
    }

    #[test]
    fn test_new_rejects_bad_input() {
        assert_eq!(Embedding::new(vec![]), Err(EmbeddingError::Empty));
        assert_eq!(Embedding::new(vec![0.0, 0.0]), Err(EmbeddingError::ZeroNorm));
        assert_eq!(
            Embedding::new(vec![1.0, f32::NAN]),
            Err(EmbeddingError::NonFinite)
        );
    }

    #[test]
    fn test_cosine_similarity_identical_and_orthogonal() {
        let a = Embedding::new(vec![0.6, 0.8]).unwrap();
        let b = Embedding::new(vec![1.0, 0.0]).unwrap();
        let c = Embedding::new(vec![0.0, 1.0]).unwrap();
        assert_relative_eq!(a.cosine_similarity(&a), 1.0, epsilon = 1e-6);
        assert_relative_eq!(b.cosine_similarity(&c), 0.0, epsilon = 1e-9);
        assert_relative_eq!(b.cosine_distance(&c), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_centroid_is_renormalized_mean() {
        let a = Embedding::new(vec![1.0, 0.0]).unwrap();
        let b = Embedding::new(vec![0.0, 1.0]).unwrap();
        let c = Embedding::centroid([&a, &b]).unwrap();
        let h = std::f32::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(c.as_slice()[0], h, epsilon = 1e-6);
        assert_relative_eq!(c.as_slice()[1], h, epsilon = 1e-6);
    }

    #[test]
    fn test_centroid_degenerate_cases() {
        let a = Embedding::new(vec![1.0, 0.0]).unwrap();
        let opposite = Embedding::new(vec![-1.0, 0.0]).unwrap();
        let other_dim = Embedding::new(vec![1.0, 0.0, 0.0]).unwrap();
        assert!(Embedding::centroid(std::iter::empty::<&Embedding>()).is_none());
        assert!(Embedding::centroid([&a, &opposite]).is_none());
        assert!(Embedding::centroid([&a, &other_dim]).is_none());
    }
}
