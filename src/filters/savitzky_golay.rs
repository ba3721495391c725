// src/filters/savitzky_golay.rs
//! Savitzky-Golay smoothing: local least-squares polynomial fit.
//!
//! Interior samples use a precomputed symmetric convolution kernel (the
//! center row of the least-squares pseudo-inverse). Samples within half a
//! window of either end are refit over a shrinking asymmetric window
//! instead of zero padding, which keeps the boundary free of edge
//! artifacts.

use crate::error::{CoreError, CoreResult};
use ndarray::{Array1, Array2};

/// Smooth a sample sequence with the given window length (odd) and
/// polynomial order. Callers validate parameters beforehand; see
/// [`crate::config::FilterConfig::validate`].
pub fn smooth(samples: &[f32], window_length: usize, poly_order: usize) -> CoreResult<Vec<f32>> {
    let n = samples.len();
    let half = window_length / 2;
    let kernel = interior_kernel(window_length, poly_order)?;

    let mut out = vec![0.0f32; n];
    for i in 0..n {
        if i >= half && i + half < n {
            let mut acc = 0.0f64;
            for (j, c) in kernel.iter().enumerate() {
                acc += c * f64::from(samples[i - half + j]);
            }
            out[i] = acc as f32;
        } else {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(n);
            let window = &samples[start..end];
            let order = poly_order.min(window.len() - 1);
            out[i] = fit_eval(window, (i - start) as f64, order)? as f32;
        }
    }
    Ok(out)
}

/// Convolution coefficients for the symmetric interior window: the first
/// row of (AᵀA)⁻¹Aᵀ where A is the Vandermonde matrix over centered
/// abscissae. Solved in f64; f32 normal equations lose rank for wide
/// windows.
fn interior_kernel(window_length: usize, poly_order: usize) -> CoreResult<Vec<f64>> {
    let half = (window_length / 2) as i64;
    let k = poly_order + 1;

    let mut gram = Array2::<f64>::zeros((k, k));
    for r in -half..=half {
        let powers = abscissa_powers(r as f64, k);
        for a in 0..k {
            for b in 0..k {
                gram[[a, b]] += powers[a] * powers[b];
            }
        }
    }

    let mut unit = Array1::<f64>::zeros(k);
    unit[0] = 1.0;
    let row = solve(gram, unit)
        .ok_or_else(|| CoreError::config("savitzky-golay", "singular normal equations"))?;

    let coefficients = (-half..=half)
        .map(|r| {
            let powers = abscissa_powers(r as f64, k);
            powers.iter().zip(row.iter()).map(|(p, c)| p * c).sum()
        })
        .collect();
    Ok(coefficients)
}

/// Fit a polynomial of `order` over the window and evaluate it at `x0`
/// (window-relative index). Abscissae are centered for conditioning.
fn fit_eval(window: &[f32], x0: f64, order: usize) -> CoreResult<f64> {
    let len = window.len();
    let k = order + 1;
    let center = (len as f64 - 1.0) / 2.0;

    let mut gram = Array2::<f64>::zeros((k, k));
    let mut rhs = Array1::<f64>::zeros(k);
    for (idx, &value) in window.iter().enumerate() {
        let powers = abscissa_powers(idx as f64 - center, k);
        for a in 0..k {
            rhs[a] += powers[a] * f64::from(value);
            for b in 0..k {
                gram[[a, b]] += powers[a] * powers[b];
            }
        }
    }

    let coeffs = solve(gram, rhs)
        .ok_or_else(|| CoreError::config("savitzky-golay", "singular boundary fit"))?;
    let powers = abscissa_powers(x0 - center, k);
    Ok(powers.iter().zip(coeffs.iter()).map(|(p, c)| p * c).sum())
}

fn abscissa_powers(x: f64, k: usize) -> Vec<f64> {
    let mut powers = vec![1.0; k];
    for p in 1..k {
        powers[p] = powers[p - 1] * x;
    }
    powers
}

/// Gaussian elimination with partial pivoting. Returns None for singular
/// systems (cannot occur for a Vandermonde window longer than the order,
/// which validation guarantees).
fn solve(mut g: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let k = b.len();
    for col in 0..k {
        let mut pivot = col;
        for row in (col + 1)..k {
            if g[[row, col]].abs() > g[[pivot, col]].abs() {
                pivot = row;
            }
        }
        if g[[pivot, col]].abs() < 1e-12 {
            return None;
        }
        if pivot != col {
            for c in 0..k {
                g.swap([pivot, c], [col, c]);
            }
            b.swap(pivot, col);
        }
        for row in (col + 1)..k {
            let factor = g[[row, col]] / g[[col, col]];
            for c in col..k {
                g[[row, c]] -= factor * g[[col, c]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(k);
    for row in (0..k).rev() {
        let mut acc = b[row];
        for c in (row + 1)..k {
            acc -= g[[row, c]] * x[c];
        }
        x[row] = acc / g[[row, row]];
    }
    Some(x)
}
