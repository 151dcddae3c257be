//! Per-read group decisions for alignment filtering.

use std::fmt;

use log::warn;
use noodles::bam;
use noodles::sam::alignment::RecordBuf;

use crate::read_groups::ReadGroup;

/// The few alignment fields the classifier looks at.
pub trait Alignment {
    fn read_name(&self) -> &[u8];
    fn is_secondary(&self) -> bool;
    fn is_supplementary(&self) -> bool;
    /// 255 when the aligner left it unset.
    fn mapq(&self) -> u8;

    /// Anything that is not a secondary alignment, supplementary included.
    fn is_primary(&self) -> bool {
        !self.is_secondary()
    }
}

const MISSING_MAPQ: u8 = 255;

impl Alignment for bam::Record {
    fn read_name(&self) -> &[u8] {
        self.name()
            .map(|name| <_ as AsRef<[u8]>>::as_ref(name))
            .unwrap_or_default()
    }

    fn is_secondary(&self) -> bool {
        self.flags().is_secondary()
    }

    fn is_supplementary(&self) -> bool {
        self.flags().is_supplementary()
    }

    fn mapq(&self) -> u8 {
        self.mapping_quality()
            .map(|q| q.get())
            .unwrap_or(MISSING_MAPQ)
    }
}

impl Alignment for RecordBuf {
    fn read_name(&self) -> &[u8] {
        self.name()
            .map(|name| <_ as AsRef<[u8]>>::as_ref(name))
            .unwrap_or_default()
    }

    fn is_secondary(&self) -> bool {
        self.flags().is_secondary()
    }

    fn is_supplementary(&self) -> bool {
        self.flags().is_supplementary()
    }

    fn mapq(&self) -> u8 {
        self.mapping_quality()
            .map(|q| q.get())
            .unwrap_or(MISSING_MAPQ)
    }
}

/// Bare flags and mapping quality of one alignment, for callers that
/// already decoded their records (Python arrays, tests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagRecord {
    pub name: Vec<u8>,
    pub secondary: bool,
    pub supplementary: bool,
    pub mapq: u8,
}

impl FlagRecord {
    pub fn new(name: impl Into<Vec<u8>>, secondary: bool, supplementary: bool, mapq: u8) -> Self {
        Self {
            name: name.into(),
            secondary,
            supplementary,
            mapq,
        }
    }

    pub fn primary(name: &str, mapq: u8) -> Self {
        Self::new(name, false, false, mapq)
    }

    pub fn secondary(name: &str, mapq: u8) -> Self {
        Self::new(name, true, false, mapq)
    }

    pub fn supplementary(name: &str, mapq: u8) -> Self {
        Self::new(name, false, true, mapq)
    }
}

impl Alignment for FlagRecord {
    fn read_name(&self) -> &[u8] {
        &self.name
    }

    fn is_secondary(&self) -> bool {
        self.secondary
    }

    fn is_supplementary(&self) -> bool {
        self.supplementary
    }

    fn mapq(&self) -> u8 {
        self.mapq
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupPolicy {
    /// Keep reads with at least two alignments, one of them supplementary.
    Chimeric,
    /// Keep reads whose best primary alignment reaches `min_quality`.
    Quality { min_quality: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    TooFewRecords,
    NoSupplementary,
    NoPrimary,
    LowQuality { observed: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Emit,
    Discard(DiscardReason),
}

impl GroupPolicy {
    pub fn decide<R: Alignment>(&self, records: &[R]) -> Decision {
        match *self {
            GroupPolicy::Chimeric => {
                if records.len() < 2 {
                    Decision::Discard(DiscardReason::TooFewRecords)
                } else if records.iter().any(Alignment::is_supplementary) {
                    Decision::Emit
                } else {
                    Decision::Discard(DiscardReason::NoSupplementary)
                }
            }
            GroupPolicy::Quality { min_quality } => {
                let best = records
                    .iter()
                    .filter(|r| r.is_primary())
                    .map(Alignment::mapq)
                    .max();
                match best {
                    None => Decision::Discard(DiscardReason::NoPrimary),
                    Some(observed) if observed >= min_quality => Decision::Emit,
                    Some(observed) => Decision::Discard(DiscardReason::LowQuality { observed }),
                }
            }
        }
    }
}

/// Running record counts over a filter run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionTally {
    pub records_processed: usize,
    pub records_retained: usize,
}

impl RetentionTally {
    #[inline]
    pub fn add(&mut self, processed: usize, retained: usize) {
        self.records_processed += processed;
        self.records_retained += retained;
    }

    pub fn fraction_retained(&self) -> f64 {
        if self.records_processed == 0 {
            return 0.0;
        }
        self.records_retained as f64 / self.records_processed as f64
    }
}

impl fmt::Display for RetentionTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "records_processed={}\trecords_retained={}\tfraction_retained={}",
            self.records_processed,
            self.records_retained,
            self.fraction_retained()
        )
    }
}

/// Applies a [`GroupPolicy`] group by group and keeps the totals.
#[derive(Debug, Clone)]
pub struct GroupClassifier {
    policy: GroupPolicy,
    tally: RetentionTally,
}

impl GroupClassifier {
    pub fn new(policy: GroupPolicy) -> Self {
        Self {
            policy,
            tally: RetentionTally::default(),
        }
    }

    /// Returns the group's records when the whole group is kept.
    pub fn classify<K, R>(&mut self, group: ReadGroup<K, R>) -> Option<Vec<R>>
    where
        K: fmt::Debug,
        R: Alignment,
    {
        let decision = self.policy.decide(&group.records);
        let n = group.records.len();

        match decision {
            Decision::Emit => {
                self.tally.add(n, n);
                Some(group.records)
            }
            Decision::Discard(reason) => {
                if reason == DiscardReason::NoPrimary {
                    warn!(
                        "Read {:?} has no primary alignment, dropping its {} records",
                        group.key, n
                    );
                }
                self.tally.add(n, 0);
                None
            }
        }
    }

    pub fn policy(&self) -> GroupPolicy {
        self.policy
    }

    pub fn tally(&self) -> RetentionTally {
        self.tally
    }
}
