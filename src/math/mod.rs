//! Numeric kernels used by the estimators: standard-normal pdf/cdf/inverse-cdf
//! approximations, empirical quantiles with numpy-style linear interpolation,
//! tail means, sample moments, and a PSD-tolerant Cholesky factorization for
//! multivariate normal draws.
//!
//! References:
//! - Abramowitz and Stegun, formula 7.1.26 (normal CDF).
//! - Acklam (2003), rational approximation of the normal inverse CDF.
//! - Glasserman (2004), Cholesky factorization for correlated simulation.

use nalgebra::DMatrix;

/// Standard normal density.
pub fn normal_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF via the Abramowitz-Stegun 7.1.26 polynomial.
///
/// Max absolute error is around `7.5e-8`, which is far below the statistical
/// noise of any estimator in this crate.
pub fn normal_cdf(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.231_641_9 * z);
    let poly = t
        * (0.319_381_530
            + t * (-0.356_563_782
                + t * (1.781_477_937 + t * (-1.821_255_978 + t * 1.330_274_429))));
    let approx = 1.0 - normal_pdf(z) * poly;
    if x >= 0.0 { approx } else { 1.0 - approx }
}

/// Inverse standard normal CDF (Acklam's rational approximation).
///
/// Relative error below `1.15e-9` over the open unit interval. Returns
/// `-inf`/`+inf` at the endpoints and `NaN` outside `[0, 1]`.
pub fn normal_inv_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.024_25;

    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let horner = |coeffs: &[f64], x: f64| coeffs.iter().fold(0.0, |acc, c| acc * x + c);

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        horner(&C, q) / (horner(&D, q) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        horner(&A, r) * q / (horner(&B, r) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -horner(&C, q) / (horner(&D, q) * q + 1.0)
    }
}

/// Empirical p-quantile with linear interpolation between order statistics.
///
/// Sorts `sample` in place. Matches the default numpy/pandas quantile
/// definition: rank `p * (n - 1)` interpolated between the two nearest
/// sorted values.
///
/// # Panics
/// Panics if `sample` is empty or `p` is outside `[0, 1]`.
pub fn empirical_quantile(sample: &mut [f64], p: f64) -> f64 {
    assert!(!sample.is_empty(), "sample must not be empty");
    assert!((0.0..=1.0).contains(&p), "p must be in [0,1]");

    sample.sort_by(|a, b| a.total_cmp(b));
    if sample.len() == 1 {
        return sample[0];
    }

    let rank = p * (sample.len() as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sample[lo]
    } else {
        let w = rank - lo as f64;
        sample[lo] + w * (sample[hi] - sample[lo])
    }
}

/// Mean of the values at or above `threshold`.
///
/// Used for Expected Shortfall: with an interpolated quantile threshold the
/// tail is never empty in practice; the threshold itself is returned as a
/// fallback if it were.
pub fn tail_mean(values: &[f64], threshold: f64) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for &x in values {
        if x >= threshold {
            sum += x;
            count += 1;
        }
    }
    if count == 0 {
        threshold
    } else {
        sum / count as f64
    }
}

pub fn sample_mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased sample variance (denominator `n - 1`).
///
/// # Panics
/// Panics with fewer than 2 observations.
pub fn sample_variance(values: &[f64]) -> f64 {
    assert!(values.len() >= 2, "at least 2 observations are required");
    let mean = sample_mean(values);
    let mut sum = 0.0;
    for &x in values {
        let d = x - mean;
        sum += d * d;
    }
    sum / (values.len() as f64 - 1.0)
}

pub fn sample_std_dev(values: &[f64]) -> f64 {
    sample_variance(values).max(0.0).sqrt()
}

/// Cholesky factorization for symmetric positive semi-definite matrices.
///
/// Returns lower-triangular `L` with `L L^T ~= matrix`. A zero (or slightly
/// negative, within `tol`) pivot is clamped to `tol`, so singular covariance
/// matrices (a zero-volatility asset, a perfectly collinear pair) still
/// factorize and simulate as near-deterministic draws. Returns `None` when a
/// pivot is negative beyond `tol`, i.e. the matrix is indefinite.
pub fn cholesky_lower_psd(matrix: &DMatrix<f64>, tol: f64) -> Option<DMatrix<f64>> {
    let n = matrix.nrows();
    if n == 0 || matrix.ncols() != n {
        return None;
    }

    let mut l = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in 0..=i {
            let mut sum = matrix[(i, j)];
            for k in 0..j {
                sum -= l[(i, k)] * l[(j, k)];
            }

            if i == j {
                if sum < -tol {
                    return None;
                }
                l[(i, j)] = sum.max(tol).sqrt();
            } else if l[(j, j)] > tol {
                l[(i, j)] = sum / l[(j, j)];
            }
        }
    }

    Some(l)
}
