//! Small numeric helpers: timing statistics and angular moments.
#![allow(clippy::cast_precision_loss)]

/// Legendre polynomial `P_l(x)` for orders 1 through 5.
///
/// Orders outside 1..=5 return 0; the tagging features only ever use
/// the first five moments.
#[must_use]
pub fn legendre_p(order: u32, x: f32) -> f32 {
    let x = f64::from(x);
    let value = match order {
        1 => x,
        2 => (3.0 * x * x - 1.0) / 2.0,
        3 => (5.0 * x * x * x - 3.0 * x) / 2.0,
        4 => (35.0 * x.powi(4) - 30.0 * x * x + 3.0) / 8.0,
        5 => (63.0 * x.powi(5) - 70.0 * x * x * x + 15.0 * x) / 8.0,
        _ => 0.0,
    };
    value as f32
}

/// Root-mean-square deviation of a set of hit times from their mean.
///
/// Returns 0 for fewer than two times.
#[must_use]
pub fn time_rms(times: &[f32]) -> f32 {
    if times.len() < 2 {
        return 0.0;
    }
    let n = times.len() as f64;
    let mean = times.iter().map(|&t| f64::from(t)).sum::<f64>() / n;
    let var = times
        .iter()
        .map(|&t| {
            let d = f64::from(t) - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    var.sqrt() as f32
}

/// Fisher skewness `m3 / m2^(3/2)` of a set of hit times, using the
/// biased (population) moments. Returns 0 for degenerate inputs with
/// zero time variance or fewer than three times.
#[must_use]
pub fn time_skewness(times: &[f32]) -> f32 {
    if times.len() < 3 {
        return 0.0;
    }
    let n = times.len() as f64;
    let mean = times.iter().map(|&t| f64::from(t)).sum::<f64>() / n;
    let (mut m2, mut m3) = (0.0f64, 0.0f64);
    for &t in times {
        let d = f64::from(t) - mean;
        m2 += d * d;
        m3 += d * d * d;
    }
    m2 /= n;
    m3 /= n;
    if m2 <= f64::EPSILON {
        return 0.0;
    }
    (m3 / m2.powf(1.5)) as f32
}

/// Angular isotropy ("beta") moments of a set of hit directions.
///
/// `directions` are unit vectors from the reference vertex to the hit
/// sensors. The l-th moment is the mean of `P_l` over the cosines of
/// all pairwise direction angles, for l = 1..=5. Fewer than two
/// directions yield all zeros.
#[must_use]
pub fn beta_moments(directions: &[[f32; 3]]) -> [f32; 5] {
    let n = directions.len();
    if n < 2 {
        return [0.0; 5];
    }

    let mut sums = [0.0f64; 5];
    for i in 0..n {
        for j in (i + 1)..n {
            let a = directions[i];
            let b = directions[j];
            let cosine = a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
            // Unit-vector dot products can drift slightly out of range.
            let cosine = cosine.clamp(-1.0, 1.0);
            for (l, sum) in sums.iter_mut().enumerate() {
                *sum += f64::from(legendre_p(l as u32 + 1, cosine));
            }
        }
    }

    let pairs = (n * (n - 1) / 2) as f64;
    let mut betas = [0.0f32; 5];
    for (beta, sum) in betas.iter_mut().zip(sums.iter()) {
        *beta = (sum / pairs) as f32;
    }
    betas
}

/// Normalizes a vector to unit length; zero-length input stays zero.
#[must_use]
pub fn unit_vector(v: [f32; 3]) -> [f32; 3] {
    let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if norm <= f32::EPSILON {
        return [0.0; 3];
    }
    [v[0] / norm, v[1] / norm, v[2] / norm]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_legendre_at_one() {
        // Every P_l(1) == 1.
        for order in 1..=5 {
            assert_relative_eq!(legendre_p(order, 1.0), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_legendre_known_values() {
        assert_relative_eq!(legendre_p(1, 0.5), 0.5);
        assert_relative_eq!(legendre_p(2, 0.5), -0.125);
        assert_relative_eq!(legendre_p(3, 0.0), 0.0);
        assert_relative_eq!(legendre_p(4, 0.0), 3.0 / 8.0);
        assert_relative_eq!(legendre_p(5, 0.0), 0.0);
    }

    #[test]
    fn test_time_rms() {
        // Symmetric pair around the mean: rms equals half the spread.
        assert_relative_eq!(time_rms(&[0.0, 2.0]), 1.0);
        assert_relative_eq!(time_rms(&[5.0]), 0.0);
        assert_relative_eq!(time_rms(&[3.0, 3.0, 3.0]), 0.0);
    }

    #[test]
    fn test_time_skewness_sign() {
        // Right-tailed sample skews positive.
        assert!(time_skewness(&[0.0, 0.0, 0.0, 10.0]) > 0.0);
        assert!(time_skewness(&[0.0, 10.0, 10.0, 10.0]) < 0.0);
        assert_relative_eq!(time_skewness(&[1.0, 2.0, 3.0]), 0.0, epsilon = 1e-6);
        assert_relative_eq!(time_skewness(&[4.0, 4.0, 4.0]), 0.0);
    }

    #[test]
    fn test_beta_moments_collinear() {
        // All directions identical: cos = 1 for every pair, so every
        // beta is P_l(1) = 1.
        let dirs = vec![[0.0, 0.0, 1.0]; 4];
        let betas = beta_moments(&dirs);
        for beta in betas {
            assert_relative_eq!(beta, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_beta_moments_back_to_back() {
        // Two opposite directions: cos = -1, so beta_l = P_l(-1) = (-1)^l.
        let dirs = vec![[0.0, 0.0, 1.0], [0.0, 0.0, -1.0]];
        let betas = beta_moments(&dirs);
        assert_relative_eq!(betas[0], -1.0, epsilon = 1e-6);
        assert_relative_eq!(betas[1], 1.0, epsilon = 1e-6);
        assert_relative_eq!(betas[2], -1.0, epsilon = 1e-6);
        assert_relative_eq!(betas[3], 1.0, epsilon = 1e-6);
        assert_relative_eq!(betas[4], -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_beta_moments_too_few_directions() {
        assert_eq!(beta_moments(&[[0.0, 0.0, 1.0]]), [0.0; 5]);
    }

    #[test]
    fn test_unit_vector() {
        let u = unit_vector([3.0, 0.0, 4.0]);
        assert_relative_eq!(u[0], 0.6);
        assert_relative_eq!(u[2], 0.8);
        assert_eq!(unit_vector([0.0; 3]), [0.0; 3]);
    }
}
