//! Per-chromosome index of padded exon boundaries.
//!
//! Every exon contributes two intervals, one around each of its boundaries,
//! widened by the fuzzy tolerance. A breakpoint "matches" when it falls in
//! any of them; the index does not remember which exon or which side a
//! boundary came from.

use std::path::Path;
use std::time::Instant;

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::error::Error;
use crate::evidence_structs::{BreakpointDescriptor, ExonBoundary, Interval};
use crate::sorts;
use crate::table;

/// Padded intervals of one chromosome, sorted by start.
///
/// `max_ends[i]` is the largest end among `starts[..=i]`, so a point query
/// is one binary search: the point is covered iff some interval starting at
/// or before it ends after it.
#[derive(Debug, Clone, Default)]
pub struct ChromIntervals {
    starts: Vec<i64>,
    max_ends: Vec<i64>,
}

impl ChromIntervals {
    fn from_sorted(intervals: &[Interval]) -> Self {
        let mut starts = Vec::with_capacity(intervals.len());
        let mut max_ends = Vec::with_capacity(intervals.len());
        let mut running = i64::MIN;

        for interval in intervals {
            running = running.max(interval.end);
            starts.push(interval.start);
            max_ends.push(running);
        }

        Self { starts, max_ends }
    }

    #[inline]
    pub fn contains(&self, pos: i64) -> bool {
        let n = self.starts.partition_point(|&start| start <= pos);
        n > 0 && self.max_ends[n - 1] > pos
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }
}

/// Immutable after construction; share it by reference across threads.
#[derive(Debug, Clone)]
pub struct IntervalIndex {
    chroms: FxHashMap<String, ChromIntervals>,
    fuzzy: i64,
}

impl IntervalIndex {
    pub fn build<I>(boundaries: I, fuzzy: i64) -> Result<Self, Error>
    where
        I: IntoIterator<Item = ExonBoundary>,
    {
        if fuzzy < 0 {
            return Err(Error::Parameter(format!(
                "fuzzy distance must be >= 0, got {}",
                fuzzy
            )));
        }

        let start = Instant::now();

        let mut codes: FxHashMap<String, i64> = FxHashMap::default();
        let mut names: Vec<String> = Vec::new();
        let mut chrs = Vec::new();
        let mut lefts = Vec::new();
        let mut rights = Vec::new();

        for boundary in boundaries {
            let code = match codes.get(&boundary.chrom) {
                Some(&code) => code,
                None => {
                    let code = names.len() as i64;
                    codes.insert(boundary.chrom.clone(), code);
                    names.push(boundary.chrom);
                    code
                }
            };
            chrs.push(code);
            lefts.push(boundary.left);
            rights.push(boundary.right);
        }

        let padded = sorts::build_padded_boundary_intervals(&chrs, &lefts, &rights, fuzzy)?;
        let chroms = sorts::split_by_chromosome(padded)
            .into_iter()
            .map(|(code, intervals)| {
                (
                    names[code as usize].clone(),
                    ChromIntervals::from_sorted(&intervals),
                )
            })
            .collect();

        debug!("Time elapsed building interval index: {:?}", start.elapsed());

        Ok(Self { chroms, fuzzy })
    }

    /// Builds the index from a reference exon table (plain or gzipped TSV).
    pub fn from_path<P: AsRef<Path>>(path: P, fuzzy: i64) -> Result<Self, Error> {
        let boundaries = table::read_exon_boundaries(path.as_ref())?;
        let index = Self::build(boundaries, fuzzy)?;
        info!(
            "Indexed {} padded boundaries on {} chromosomes (fuzzy = {})",
            index.len(),
            index.chroms.len(),
            fuzzy
        );
        Ok(index)
    }

    /// True iff `pos` lies in a padded boundary interval on `chrom`.
    /// Chromosomes absent from the reference never match.
    pub fn contains(&self, chrom: &str, pos: i64) -> bool {
        self.chroms
            .get(chrom)
            .is_some_and(|intervals| intervals.contains(pos))
    }

    pub fn contains_breakpoint(&self, breakpoint: &BreakpointDescriptor) -> bool {
        self.contains(&breakpoint.chrom, breakpoint.coordinate)
    }

    pub fn fuzzy(&self) -> i64 {
        self.fuzzy
    }

    /// Number of padded intervals across all chromosomes.
    pub fn len(&self) -> usize {
        self.chroms.values().map(ChromIntervals::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chroms.values().all(ChromIntervals::is_empty)
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.chroms.keys().map(String::as_str)
    }
}
