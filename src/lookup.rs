// src/lookup.rs - Nearest-timestamp lookup over a sorted frame sequence
use crate::data::FrameSample;

/// Returns the sample whose timestamp is closest to `t`, in O(log n).
///
/// The sequence must be non-decreasing in timestamp (guaranteed at load
/// time). On an exact tie the earlier sample wins. An empty sequence yields
/// `None` and the caller draws nothing that tick.
pub fn nearest_sample(frames: &[FrameSample], t: f64) -> Option<&FrameSample> {
    if frames.is_empty() {
        return None;
    }

    let idx = frames.partition_point(|f| f.timestamp < t);
    if idx == 0 {
        return frames.first();
    }
    if idx == frames.len() {
        return frames.last();
    }

    let before = &frames[idx - 1];
    let after = &frames[idx];
    if t - before.timestamp <= after.timestamp - t {
        Some(before)
    } else {
        Some(after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PoseSample;

    fn sequence(timestamps: &[f64]) -> Vec<FrameSample> {
        timestamps
            .iter()
            .map(|&timestamp| FrameSample { timestamp, pose: PoseSample::default() })
            .collect()
    }

    #[test]
    fn empty_sequence_yields_none() {
        assert!(nearest_sample(&[], 1.0).is_none());
    }

    #[test]
    fn picks_minimal_distance() {
        let frames = sequence(&[0.0, 0.5, 1.0]);
        // 0.74 is closer to 0.5 (0.24) than to 1.0 (0.26)
        assert_eq!(nearest_sample(&frames, 0.74).unwrap().timestamp, 0.5);
        assert_eq!(nearest_sample(&frames, 0.76).unwrap().timestamp, 1.0);
        assert_eq!(nearest_sample(&frames, 0.1).unwrap().timestamp, 0.0);
    }

    #[test]
    fn exact_tie_prefers_earlier_sample() {
        let frames = sequence(&[0.0, 0.5, 1.0]);
        assert_eq!(nearest_sample(&frames, 0.75).unwrap().timestamp, 0.5);
        assert_eq!(nearest_sample(&frames, 0.25).unwrap().timestamp, 0.0);
    }

    #[test]
    fn duplicate_timestamps_resolve_to_lowest_index() {
        let frames = sequence(&[0.5, 0.5, 0.5]);
        let hit = nearest_sample(&frames, 0.5).unwrap();
        assert!(std::ptr::eq(hit, &frames[0]));
    }

    #[test]
    fn clamps_outside_the_sequence() {
        let frames = sequence(&[1.0, 2.0]);
        assert_eq!(nearest_sample(&frames, -5.0).unwrap().timestamp, 1.0);
        assert_eq!(nearest_sample(&frames, 99.0).unwrap().timestamp, 2.0);
    }

    #[test]
    fn dense_sequence_matches_linear_scan() {
        let timestamps: Vec<f64> = (0..300).map(|i| i as f64 / 30.0).collect();
        let frames = sequence(&timestamps);

        for &query in &[0.0, 3.3, 3.316, 5.0166, 9.966, 10.5] {
            let expected = frames
                .iter()
                .min_by(|a, b| {
                    (a.timestamp - query)
                        .abs()
                        .partial_cmp(&(b.timestamp - query).abs())
                        .unwrap()
                })
                .unwrap();
            assert_eq!(
                nearest_sample(&frames, query).unwrap().timestamp,
                expected.timestamp,
                "query {query}"
            );
        }
    }
}
