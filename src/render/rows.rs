use std::ops::Range;

/// Number of workers for `rows` rows: `min(rows, threads)`, at least one.
pub(crate) fn worker_count(rows: u32, threads: usize, single_threaded: bool) -> usize {
    if single_threaded {
        return 1;
    }
    threads.min(rows as usize).max(1)
}

/// Split `rows` into `workers` contiguous ranges whose sizes differ by at most one row.
///
/// Larger ranges come first. Returns fewer ranges than `workers` only when there are fewer rows.
pub(crate) fn row_ranges(rows: u32, workers: usize) -> Vec<Range<u32>> {
    let workers = workers.clamp(1, (rows as usize).max(1)) as u32;
    let base = rows / workers;
    let extra = rows % workers;
    let mut out = Vec::with_capacity(workers as usize);
    let mut start = 0;
    for i in 0..workers {
        let len = base + u32::from(i < extra);
        out.push(start..start + len);
        start += len;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/rows.rs"]
mod tests;
