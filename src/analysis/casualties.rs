//! Casualties-per-hour and activity tiers.

use crate::api::canonical_map_name;
use crate::history::Snapshot;

use serde::Serialize;

/// Number of most recent snapshots the rate is measured across
/// (one hour at 10 minute ticks).
pub const RATE_WINDOW: usize = 6;

/// Non-negative casualty deltas per faction across the rate window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CasualtyRate {
    pub colonial: u64,
    pub warden: u64,
}

impl CasualtyRate {
    pub fn total(&self) -> u64 {
        self.colonial + self.warden
    }

    pub fn tier(&self) -> ActivityTier {
        ActivityTier::classify(self.total())
    }
}

/// Compute the casualty rate of `map_name` from a history, oldest first.
///
/// Compares the first and last of the most recent [`RATE_WINDOW`] snapshots.
/// Fewer than two snapshots, or a map missing from either end, gives zero.
/// Decreasing counters clamp to zero.
pub fn casualty_rate<'a, I>(history: I, map_name: &str) -> CasualtyRate
where
    I: IntoIterator<Item = &'a Snapshot>,
    I::IntoIter: DoubleEndedIterator + ExactSizeIterator,
{
    let iter = history.into_iter();
    let len = iter.len();
    if len < 2 {
        return CasualtyRate::default();
    }

    let mut recent = iter.skip(len.saturating_sub(RATE_WINDOW));
    let (first, last) = match (recent.next(), recent.next_back()) {
        (Some(first), Some(last)) => (first, last),
        _ => return CasualtyRate::default(),
    };

    let name = canonical_map_name(map_name);
    let (first, last) = match (first.war_report(name), last.war_report(name)) {
        (Some(first), Some(last)) => (first, last),
        _ => return CasualtyRate::default(),
    };

    CasualtyRate {
        colonial: clamped_delta(first.colonial_casualties, last.colonial_casualties),
        warden: clamped_delta(first.warden_casualties, last.warden_casualties),
    }
}

fn clamped_delta(first: i64, last: i64) -> u64 {
    u64::try_from(last.saturating_sub(first)).unwrap_or(0)
}

/// Activity classification of a summed casualty rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityTier {
    None,
    Low,
    Medium,
    High,
}

impl ActivityTier {
    /// Thresholds are inclusive lower bounds: 50, 501, 1001.
    pub fn classify(total: u64) -> Self {
        match total {
            1001.. => ActivityTier::High,
            501..=1000 => ActivityTier::Medium,
            50..=500 => ActivityTier::Low,
            _ => ActivityTier::None,
        }
    }
}
