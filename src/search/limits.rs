//! Search limits and the driver-side stop test. The recursive search never
//! calls this directly; the iterative-deepening driver polls it between
//! depth iterations and arms the searcher's deadline from it.

use std::time::{Duration, Instant};

use crate::search::alphabeta::SearchStats;

const MIN_THINKING_TIME: Duration = Duration::from_millis(100);
const DEFAULT_MOVES_TO_GO: u32 = 30;

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchLimits {
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
    pub movetime: Option<Duration>,
}

pub struct TimeManager {
    deadline: Option<Instant>,
    node_limit: u64,
}

impl TimeManager {
    pub fn new(limits: &SearchLimits) -> Self {
        Self {
            deadline: limits.movetime.map(|d| Instant::now() + d),
            node_limit: limits.nodes.unwrap_or(u64::MAX),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn should_stop(&self, stats: &SearchStats) -> bool {
        if stats.nodes >= self.node_limit {
            return true;
        }
        if let Some(dl) = self.deadline {
            if Instant::now() >= dl {
                return true;
            }
        }
        false
    }

    /// Budget for one move out of a remaining clock: an even split over the
    /// expected horizon plus most of the increment, floored so short clocks
    /// still get a real search.
    pub fn alloc(remaining: Duration, increment: Duration, movestogo: Option<u32>) -> Duration {
        let horizon = movestogo.unwrap_or(DEFAULT_MOVES_TO_GO).max(1);
        let base = remaining / horizon + increment.mul_f64(0.75);
        base.max(MIN_THINKING_TIME).min(remaining.mul_f64(0.8))
    }
}
