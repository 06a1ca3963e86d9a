//! Beta distribution CDF and quantile function.
//!
//! The CDF is the regularized incomplete beta function I_x(a,b) computed
//! with the Numerical Recipes continued fraction; the quantile inverts it
//! by bisection. Termination rules (confidence stopping, filter
//! exhaustion) only need the CDF to be monotone in x and in (alpha, beta),
//! which both routines preserve.

use super::stable::log_beta;

const BETACF_MAX_ITERS: usize = 200;
const BETACF_EPS: f64 = 3.0e-7;
const BETACF_FPMIN: f64 = 1.0e-30;
const INV_CDF_TOL: f64 = 1e-10;
const INV_CDF_MAX_ITERS: usize = 200;

/// Regularized incomplete beta function I_x(a,b).
///
/// Returns NaN for invalid parameters; clamps x outside [0,1] to the
/// boundary values 0 and 1.
pub fn beta_cdf(x: f64, alpha: f64, beta: f64) -> f64 {
    if x.is_nan() || alpha.is_nan() || beta.is_nan() {
        return f64::NAN;
    }
    if alpha <= 0.0 || beta <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_beta = log_beta(alpha, beta);
    let bt = (alpha * x.ln() + beta * (1.0 - x).ln() - ln_beta).exp();
    // The continued fraction converges fast for x below the mean-ish
    // threshold; use the symmetry I_x(a,b) = 1 - I_{1-x}(b,a) otherwise.
    let threshold = (alpha + 1.0) / (alpha + beta + 2.0);
    if x < threshold {
        bt * betacf(alpha, beta, x) / alpha
    } else {
        1.0 - bt * betacf(beta, alpha, 1.0 - x) / beta
    }
}

/// Inverse CDF (quantile) for Beta(alpha, beta), by bisection.
pub fn beta_inv_cdf(p: f64, alpha: f64, beta: f64) -> f64 {
    if p.is_nan() || alpha.is_nan() || beta.is_nan() {
        return f64::NAN;
    }
    if alpha <= 0.0 || beta <= 0.0 {
        return f64::NAN;
    }
    if p <= 0.0 {
        return 0.0;
    }
    if p >= 1.0 {
        return 1.0;
    }

    let mut low = 0.0;
    let mut high = 1.0;
    let mut mid = 0.5;
    for _ in 0..INV_CDF_MAX_ITERS {
        mid = 0.5 * (low + high);
        let cdf = beta_cdf(mid, alpha, beta);
        if cdf.is_nan() {
            return f64::NAN;
        }
        let delta = cdf - p;
        if delta.abs() < INV_CDF_TOL {
            return mid;
        }
        if delta < 0.0 {
            low = mid;
        } else {
            high = mid;
        }
    }
    mid
}

/// Lentz continued-fraction evaluation for the incomplete beta function.
fn betacf(alpha: f64, beta: f64, x: f64) -> f64 {
    let qab = alpha + beta;
    let qap = alpha + 1.0;
    let qam = alpha - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < BETACF_FPMIN {
        d = BETACF_FPMIN;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=BETACF_MAX_ITERS {
        let m_f = m as f64;
        let m2 = 2.0 * m_f;
        let aa = m_f * (beta - m_f) * x / ((qam + m2) * (alpha + m2));
        d = 1.0 + aa * d;
        if d.abs() < BETACF_FPMIN {
            d = BETACF_FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < BETACF_FPMIN {
            c = BETACF_FPMIN;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(alpha + m_f) * (qab + m_f) * x / ((alpha + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < BETACF_FPMIN {
            d = BETACF_FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < BETACF_FPMIN {
            c = BETACF_FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < BETACF_EPS {
            break;
        }
    }

    h
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn cdf_uniform_is_identity() {
        for &x in &[0.1, 0.42, 0.5, 0.73, 0.99] {
            assert!(approx_eq(beta_cdf(x, 1.0, 1.0), x, 1e-6));
        }
    }

    #[test]
    fn cdf_boundaries() {
        assert!(approx_eq(beta_cdf(-0.5, 2.0, 3.0), 0.0, 0.0));
        assert!(approx_eq(beta_cdf(1.5, 2.0, 3.0), 1.0, 0.0));
    }

    #[test]
    fn cdf_symmetry() {
        // I_x(a,b) = 1 - I_{1-x}(b,a)
        let left = beta_cdf(0.3, 2.5, 4.5);
        let right = 1.0 - beta_cdf(0.7, 4.5, 2.5);
        assert!(approx_eq(left, right, 1e-9));
    }

    #[test]
    fn cdf_monotone_in_x() {
        let mut prev = 0.0;
        for i in 1..50 {
            let x = i as f64 / 50.0;
            let cdf = beta_cdf(x, 3.0, 7.0);
            assert!(cdf >= prev);
            prev = cdf;
        }
    }

    #[test]
    fn cdf_monotone_in_alpha() {
        // More successes shift mass right, so CDF at fixed x decreases.
        let c1 = beta_cdf(0.5, 2.0, 5.0);
        let c2 = beta_cdf(0.5, 4.0, 5.0);
        assert!(c2 < c1);
    }

    #[test]
    fn cdf_invalid_params_nan() {
        assert!(beta_cdf(0.5, 0.0, 1.0).is_nan());
        assert!(beta_cdf(0.5, 1.0, -2.0).is_nan());
        assert!(beta_cdf(f64::NAN, 1.0, 1.0).is_nan());
    }

    #[test]
    fn inv_cdf_uniform() {
        assert!(approx_eq(beta_inv_cdf(0.73, 1.0, 1.0), 0.73, 1e-6));
    }

    #[test]
    fn inv_cdf_inverts_cdf() {
        for &(a, b) in &[(2.0, 5.0), (5.0, 2.0), (10.0, 10.0), (2.0, 1.0)] {
            for &p in &[0.05, 0.25, 0.5, 0.75, 0.95] {
                let x = beta_inv_cdf(p, a, b);
                assert!(
                    approx_eq(beta_cdf(x, a, b), p, 1e-6),
                    "round trip failed for p={} a={} b={}",
                    p,
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn inv_cdf_boundaries() {
        assert!(approx_eq(beta_inv_cdf(0.0, 2.0, 3.0), 0.0, 0.0));
        assert!(approx_eq(beta_inv_cdf(1.0, 2.0, 3.0), 1.0, 0.0));
    }
}
