use radsort::sort_by_key;
use rustc_hash::FxHashMap;

use crate::error::Error;
use crate::evidence_structs::{Event, EventKind, Interval};

/// `[boundary - slack - 1, boundary + slack + 1)`, or `None` if either end
/// leaves the `i64` range.
pub fn padded_window(boundary: i64, slack: i64) -> Option<(i64, i64)> {
    let pad = slack.checked_add(1)?;
    Some((boundary.checked_sub(pad)?, boundary.checked_add(pad)?))
}

/// Two padded intervals per exon, one around each boundary:
/// `[left - slack - 1, left + slack + 1)` and `[right - slack - 1, right + slack + 1)`.
/// Both carry the exon's row index.
pub fn build_padded_boundary_intervals(
    chrs: &[i64],
    lefts: &[i64],
    rights: &[i64],
    slack: i64,
) -> Result<Vec<Interval>, Error> {
    let mut intervals: Vec<Interval> = Vec::with_capacity(2 * chrs.len());
    for i in 0..chrs.len() {
        for boundary in [lefts[i], rights[i]] {
            let (start, end) = padded_window(boundary, slack).ok_or_else(|| {
                Error::Parameter(format!(
                    "fuzzy distance {} overflows the window around boundary {}",
                    slack, boundary
                ))
            })?;
            intervals.push(Interval {
                chr: chrs[i],
                start,
                end,
                idx: i as i64,
            });
        }
    }

    Ok(intervals)
}

pub fn sort_intervals(intervals: &mut [Interval]) {
    sort_by_key(intervals, |i| i.end);
    sort_by_key(intervals, |i| i.start);
    sort_by_key(intervals, |i| i.chr);
}

/// Groups intervals by chromosome, keeping (start, end) order inside each group.
pub fn split_by_chromosome(mut intervals: Vec<Interval>) -> FxHashMap<i64, Vec<Interval>> {
    let mut result = FxHashMap::default();
    if intervals.is_empty() {
        return result;
    }
    sort_intervals(&mut intervals);

    let mut current_chr = intervals[0].chr;
    let mut current_group = Vec::new();

    for interval in intervals {
        if current_chr != interval.chr {
            // We encountered a new chromosome, so store the old group
            result.insert(current_chr, std::mem::take(&mut current_group));
            current_chr = interval.chr;
        }
        current_group.push(interval);
    }

    if !current_group.is_empty() {
        result.insert(current_chr, current_group);
    }

    result
}

/// Events for a sweep of query points against a set of intervals.
///
/// Sorted by chromosome, then position, then kind (end, start, point).
pub fn build_sorted_point_events(
    chrs: &[i64],
    starts: &[i64],
    ends: &[i64],
    chrs2: &[i64],
    pos2: &[i64],
) -> Vec<Event> {
    let mut events: Vec<Event> = Vec::with_capacity(2 * chrs.len() + chrs2.len());

    for i in 0..chrs.len() {
        events.push(Event {
            chr: chrs[i],
            pos: starts[i],
            kind: EventKind::Start,
            idx: i as i64,
        });
        events.push(Event {
            chr: chrs[i],
            pos: ends[i],
            kind: EventKind::End,
            idx: i as i64,
        });
    }

    for j in 0..chrs2.len() {
        events.push(Event {
            chr: chrs2[j],
            pos: pos2[j],
            kind: EventKind::Point,
            idx: j as i64,
        });
    }

    sort_by_key(&mut events, |e| e.kind.rank());
    sort_by_key(&mut events, |e| e.pos);
    sort_by_key(&mut events, |e| e.chr);

    events
}
