//! Liquidity-reference observation history for shock detection.

use serde::Serialize;
use std::collections::VecDeque;

/// Time-ordered `(epoch_secs, refs)` observations for one asset.
///
/// Pruned to the burst window on every observation, so it never holds more
/// than one window's worth of points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LiquidityHistory {
    points: VecDeque<(i64, u32)>,
}

impl LiquidityHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `refs` at `now` and drop points older than `now - window_secs`.
    pub fn observe(&mut self, now: i64, refs: u32, window_secs: u64) {
        self.points.push_back((now, refs));
        let cutoff = now.saturating_sub(i64::try_from(window_secs).unwrap_or(i64::MAX));
        self.points.retain(|(ts, _)| *ts >= cutoff);
    }

    /// Newest minus oldest retained count; `None` with fewer than two points.
    pub fn burst(&self) -> Option<i64> {
        if self.points.len() < 2 {
            return None;
        }
        let (_, first) = self.points.front()?;
        let (_, last) = self.points.back()?;
        Some(i64::from(*last) - i64::from(*first))
    }

    /// Whether the latest observation qualifies as a liquidity shock.
    ///
    /// Requires `refs >= min_refs`; then either a burst of at least
    /// `burst_min` inside the window, or `refs >= max(min_refs, 1)` on its
    /// own. The second arm makes the burst arm redundant whenever
    /// `min_refs >= 1`.
    pub fn is_shock(&self, refs: u32, min_refs: u32, burst_min: i64) -> bool {
        if refs < min_refs {
            return false;
        }
        if self.burst().is_some_and(|b| b >= burst_min) {
            return true;
        }
        refs >= min_refs.max(1)
    }

    /// Timestamp of the newest observation.
    pub fn last_seen(&self) -> Option<i64> {
        self.points.back().map(|(ts, _)| *ts)
    }

    pub fn oldest(&self) -> Option<i64> {
        self.points.front().map(|(ts, _)| *ts)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = &(i64, u32)> {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prunes_outside_window() {
        let mut h = LiquidityHistory::new();
        h.observe(1_000, 10, 180);
        h.observe(1_100, 12, 180);
        h.observe(1_200, 15, 180);
        // 1_000 < 1_200 - 180
        assert_eq!(h.len(), 2);
        assert_eq!(h.oldest(), Some(1_100));
        assert_eq!(h.burst(), Some(3));
    }

    #[test]
    fn test_window_edge_is_kept() {
        let mut h = LiquidityHistory::new();
        h.observe(1_000, 10, 180);
        h.observe(1_180, 10, 180);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_never_retains_stale_points() {
        let mut h = LiquidityHistory::new();
        for (i, ts) in [0, 50, 400, 410, 1_000, 1_001].iter().enumerate() {
            h.observe(*ts, i as u32, 60);
            assert!(h.points().all(|(t, _)| *t >= ts - 60));
        }
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_shock_below_min_never_satisfied() {
        let mut h = LiquidityHistory::new();
        h.observe(0, 2, 180);
        h.observe(10, 19, 180);
        // Burst of 17 but below the floor.
        assert!(!h.is_shock(19, 20, 3));
    }

    #[test]
    fn test_lone_high_observation_is_satisfied() {
        let mut h = LiquidityHistory::new();
        h.observe(0, 25, 180);
        assert_eq!(h.burst(), None);
        assert!(h.is_shock(25, 20, 3));
    }

    #[test]
    fn test_burst_path_with_zero_floor() {
        let mut h = LiquidityHistory::new();
        h.observe(0, 0, 180);
        h.observe(10, 0, 180);
        assert!(!h.is_shock(0, 0, 3));

        let mut h = LiquidityHistory::new();
        h.observe(0, 0, 180);
        h.observe(10, 3, 180);
        assert!(h.is_shock(3, 0, 3));
    }
}
