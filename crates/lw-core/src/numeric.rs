/// Floating point type used throughout system
pub type Real = f64;

/// Returns `v` when finite, otherwise `fallback`.
#[inline]
pub fn finite_or(v: Real, fallback: Real) -> Real {
    if v.is_finite() { v } else { fallback }
}

/// Evenly spaced values over `[start, end]`, both ends included.
pub fn linspace(start: Real, end: Real, count: usize) -> Vec<Real> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as Real;
            (0..count).map(|i| start + step * i as Real).collect()
        }
    }
}
