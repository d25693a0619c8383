//! Percentile estimation from cumulative histogram buckets.

use crate::metric::HistogramSnapshot;

/// Estimate the `p`-quantile (0.0..=1.0) by linear interpolation inside the
/// bucket that crosses the target cumulative count.
///
/// Returns `None` for an empty histogram or an out-of-range `p`, and
/// `f64::INFINITY` when the target falls in the overflow bucket — there is no
/// finite upper boundary to interpolate against.
pub fn percentile(h: &HistogramSnapshot, p: f64) -> Option<f64> {
    if !(0.0..=1.0).contains(&p) || h.cumulative.is_empty() {
        return None;
    }
    let total = *h.cumulative.last()?;
    if total == 0 {
        return None;
    }
    let target = p * total as f64;

    let mut preceding = 0u64;
    for (i, &cum) in h.cumulative.iter().enumerate() {
        if (cum as f64) >= target {
            if i >= h.boundaries.len() {
                return Some(f64::INFINITY);
            }
            let lower = if i == 0 { 0.0 } else { h.boundaries[i - 1] };
            let upper = h.boundaries[i];
            let in_bucket = (cum - preceding) as f64;
            if in_bucket == 0.0 {
                return Some(upper);
            }
            let fraction = (target - preceding as f64) / in_bucket;
            return Some(lower + fraction * (upper - lower));
        }
        preceding = cum;
    }
    Some(f64::INFINITY)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn snapshot(boundaries: &[f64], cumulative: &[u64]) -> HistogramSnapshot {
        HistogramSnapshot {
            boundaries: boundaries.to_vec(),
            cumulative: cumulative.to_vec(),
            sum: 0.0,
            count: *cumulative.last().unwrap(),
        }
    }

    #[test]
    fn interpolates_inside_the_crossing_bucket() {
        // Target 10 of 20 falls in (10, 50]: 5 below, 10 in bucket, halfway.
        let h = snapshot(&[10.0, 50.0, 100.0], &[5, 15, 18, 20]);
        assert_eq!(percentile(&h, 0.5), Some(30.0));
    }

    #[test]
    fn low_quantile_interpolates_from_zero() {
        let h = snapshot(&[10.0, 50.0], &[10, 20]);
        // Target 5 of 20, halfway through the first bucket (0, 10].
        assert_eq!(percentile(&h, 0.25), Some(5.0));
    }

    #[test]
    fn overflow_bucket_yields_infinity() {
        let h = snapshot(&[10.0, 50.0], &[5, 10, 20]);
        assert_eq!(percentile(&h, 0.99), Some(f64::INFINITY));
    }

    #[test]
    fn empty_histogram_yields_none() {
        let h = snapshot(&[10.0], &[0, 0]);
        assert_eq!(percentile(&h, 0.5), None);
    }

    #[test]
    fn out_of_range_p_yields_none() {
        let h = snapshot(&[10.0], &[5, 5]);
        assert_eq!(percentile(&h, 1.5), None);
        assert_eq!(percentile(&h, -0.1), None);
    }
}
