//! Fixed-duration segmentation of an audio timeline.

use crate::error::{Result, ScribeError};
use crate::pipeline::types::Segment;

/// Split `[0, total_duration_ms)` into contiguous segments of `chunk_duration_ms`.
///
/// Every segment has the requested length except possibly the last, which is
/// truncated to end exactly at `total_duration_ms`. A zero-length input yields
/// no segments.
pub fn segment(total_duration_ms: u64, chunk_duration_ms: u64) -> Result<Vec<Segment>> {
    if chunk_duration_ms == 0 {
        return Err(ScribeError::ConfigInvalidValue {
            key: "job.chunk_duration_ms".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    let starts = std::iter::successors(Some(0u64), |start| start.checked_add(chunk_duration_ms))
        .take_while(|&start| start < total_duration_ms);
    let segments = starts
        .enumerate()
        .map(|(index, start_ms)| Segment {
            index,
            start_ms,
            end_ms: start_ms.saturating_add(chunk_duration_ms).min(total_duration_ms),
        })
        .collect();

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(segments: &[Segment], total: u64, chunk: u64) {
        let mut expected_start = 0;
        for (i, seg) in segments.iter().enumerate() {
            assert_eq!(seg.index, i, "indices must be sequential");
            assert_eq!(seg.start_ms, expected_start, "segments must be contiguous");
            assert!(seg.end_ms > seg.start_ms, "segments must be non-empty");
            assert!(seg.duration_ms() <= chunk);
            if i + 1 < segments.len() {
                assert_eq!(seg.duration_ms(), chunk, "only the last may be short");
            }
            expected_start = seg.end_ms;
        }
        assert_eq!(expected_start, total, "segments must cover the whole input");
    }

    #[test]
    fn test_reference_scenario() {
        let segments = segment(150_000, 60_000).unwrap();
        let ranges: Vec<(u64, u64)> = segments.iter().map(|s| (s.start_ms, s.end_ms)).collect();
        assert_eq!(
            ranges,
            vec![(0, 60_000), (60_000, 120_000), (120_000, 150_000)]
        );
    }

    #[test]
    fn test_exact_multiple_has_no_short_tail() {
        let segments = segment(120_000, 60_000).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].duration_ms(), 60_000);
    }

    #[test]
    fn test_shorter_than_one_chunk() {
        let segments = segment(5_000, 60_000).unwrap();
        assert_eq!(
            segments,
            vec![Segment {
                index: 0,
                start_ms: 0,
                end_ms: 5_000
            }]
        );
    }

    #[test]
    fn test_zero_duration_is_empty() {
        assert!(segment(0, 60_000).unwrap().is_empty());
    }

    #[test]
    fn test_zero_chunk_is_rejected() {
        assert!(matches!(
            segment(1_000, 0),
            Err(ScribeError::ConfigInvalidValue { .. })
        ));
    }

    #[test]
    fn test_coverage_over_many_combinations() {
        for total in [1, 2, 59_999, 60_000, 60_001, 150_000, 1_234_567] {
            for chunk in [1_000, 5_000, 60_000, 120_000] {
                let segments = segment(total, chunk).unwrap();
                assert_covers(&segments, total, chunk);
                assert_eq!(segments.len() as u64, total.div_ceil(chunk));
            }
        }
    }

    #[test]
    fn test_chunk_wider_than_usize_on_small_targets() {
        let chunk = u64::from(u32::MAX) + 10;
        let total = chunk + 5;
        let segments = segment(total, chunk).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].start_ms, chunk);
        assert_eq!(segments[1].end_ms, total);
    }

    #[test]
    fn test_last_chunk_near_u64_max_does_not_overflow() {
        let segments = segment(u64::MAX, u64::MAX / 2 + 1).unwrap();
        assert_covers(&segments, u64::MAX, u64::MAX / 2 + 1);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(segment(987_654, 7_000).unwrap(), segment(987_654, 7_000).unwrap());
    }
}
