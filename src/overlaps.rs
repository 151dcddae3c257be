use crate::error::Error;
use crate::evidence_structs::EventKind;
use crate::sorts;

/// Returns, for every query point in set2, whether it falls inside at least
/// one interval of set1.
///
/// Intervals are half-open `[start, end)`; a point `x` is the interval
/// `[x, x + 1)`. This uses a line-sweep / active-count approach:
///   1. Build events for interval starts, interval ends and query points.
///   2. Sort events by (chr, pos). Where positions tie, ends come before
///      starts and starts before points.
///   3. Keep a count of open intervals on the current chromosome. A point
///      hits when the count is positive.
pub fn sweep_line_point_hits(
    chrs: &[i64],
    starts: &[i64],
    ends: &[i64],
    chrs2: &[i64],
    pos2: &[i64],
) -> Vec<bool> {
    let mut hits = vec![false; chrs2.len()];

    if chrs.is_empty() || chrs2.is_empty() {
        return hits;
    }

    let events = sorts::build_sorted_point_events(chrs, starts, ends, chrs2, pos2);

    let mut current_chr: i64 = events[0].chr;
    let mut active: i64 = 0;

    for e in events {
        if e.chr != current_chr {
            active = 0;
            current_chr = e.chr;
        }

        match e.kind {
            EventKind::Start => active += 1,
            EventKind::End => active -= 1,
            EventKind::Point => hits[e.idx as usize] = active > 0,
        }
    }

    hits
}

/// Point hits against padded exon boundaries, the batch form of
/// [`crate::interval_index::IntervalIndex::contains`].
pub fn fuzzy_boundary_hits(
    chrs: &[i64],
    lefts: &[i64],
    rights: &[i64],
    chrs2: &[i64],
    pos2: &[i64],
    slack: i64,
) -> Result<Vec<bool>, Error> {
    let padded = sorts::build_padded_boundary_intervals(chrs, lefts, rights, slack)?;

    let mut pad_chrs = Vec::with_capacity(padded.len());
    let mut pad_starts = Vec::with_capacity(padded.len());
    let mut pad_ends = Vec::with_capacity(padded.len());
    for interval in &padded {
        pad_chrs.push(interval.chr);
        pad_starts.push(interval.start);
        pad_ends.push(interval.end);
    }

    Ok(sweep_line_point_hits(
        &pad_chrs,
        &pad_starts,
        &pad_ends,
        chrs2,
        pos2,
    ))
}
