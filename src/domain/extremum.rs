//! Local extremum scanner.
//!
//! Index `i` is a local maximum when `values[i]` is greater than or equal to
//! every other value in `[i - window, i + window]`; minima mirror this with
//! less-than-or-equal. Ties count, so a flat run produces a run of extrema.
//!
//! Only indices in `[window, n - window)` are candidates. Anything closer to
//! either end than `window` bars is never an extremum.

pub fn local_maxima(values: &[f64], window: usize) -> Vec<usize> {
    scan(values, window, |candidate, other| other <= candidate)
}

pub fn local_minima(values: &[f64], window: usize) -> Vec<usize> {
    scan(values, window, |candidate, other| other >= candidate)
}

fn scan(values: &[f64], window: usize, keeps: impl Fn(f64, f64) -> bool) -> Vec<usize> {
    let n = values.len();
    let mut indices = Vec::new();
    if window.checked_mul(2).is_none_or(|span| n <= span) {
        return indices;
    }

    for i in window..n - window {
        let candidate = values[i];
        let qualifies = (i - window..=i + window)
            .filter(|&j| j != i)
            .all(|j| keeps(candidate, values[j]));
        if qualifies {
            indices.push(i);
        }
    }
    indices
}
