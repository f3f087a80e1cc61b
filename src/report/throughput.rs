use super::types::PeriodicTaskCount;

/// One upstream throughput row. The same (year, month) bucket can appear
/// more than once when the query groups by an extra dimension (e.g. phase).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyCountRow {
    pub year: i32,
    /// 1–12.
    pub month: u32,
    pub count: u64,
}

/// Fold rows into the nested year → month → count map. Duplicate buckets
/// sum additively, never overwrite, so the fold is order-independent.
/// Months with no completions stay absent.
pub fn fold_monthly_counts(rows: &[MonthlyCountRow]) -> PeriodicTaskCount {
    let mut folded = PeriodicTaskCount::new();
    for row in rows {
        *folded
            .entry(row.year)
            .or_default()
            .entry(row.month)
            .or_insert(0) += row.count;
    }
    folded
}
