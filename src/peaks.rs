//! Local maximum search.

/// Indices of the local maxima of `x`.
///
/// A sample is a peak when it is strictly greater than its left neighbour
/// and the first differing sample to its right is strictly smaller. Flat
/// plateaus report their middle index (rounded down). The first and last
/// samples are never peaks. `NaN` samples never compare greater, so they
/// break plateaus and are never reported.
pub fn find_peaks(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }

    let last = x.len() - 1;
    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                let right_edge = ahead - 1;
                peaks.push((i + right_edge) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }
    peaks
}

/// The peak whose index is closest to `target`.
///
/// Ties go to the earlier peak.
pub fn nearest_peak(peaks: &[usize], target: usize) -> Option<usize> {
    peaks.iter().copied().min_by_key(|&p| p.abs_diff(target))
}
