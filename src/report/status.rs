use std::collections::BTreeMap;

use super::types::{StatusSlice, WorkerStatusBreakdown};

/// Raw per-status worker counts plus the caller-supplied denominator.
/// `total` is opaque: status categories may overlap upstream, so it is
/// never re-derived from the counts here.
#[derive(Debug, Clone, Default)]
pub struct StatusCounts {
    pub total: u64,
    pub by_status: Vec<(String, u64)>,
}

/// Turn raw counts into count + percentage per status. Percentages are kept
/// at full floating precision; display code rounds. A zero total yields
/// zero percentages for every key, even if individual counts are non-zero.
pub fn status_breakdown(counts: &StatusCounts) -> WorkerStatusBreakdown {
    let mut breakdown = BTreeMap::new();
    for (status, count) in &counts.by_status {
        let percentage = if counts.total > 0 {
            *count as f64 / counts.total as f64 * 100.0
        } else {
            0.0
        };
        breakdown.insert(
            status.clone(),
            StatusSlice {
                count: *count,
                percentage,
            },
        );
    }
    breakdown
}
