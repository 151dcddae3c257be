//! Groups a stream of alignment records into runs that share a read name.
//!
//! The stream must already be grouped (name-sorted or straight from the
//! aligner); records of one read that are split by another read come out as
//! two groups unless contiguity checking is turned on.

use std::hash::Hash;

use bstr::BString;
use rustc_hash::FxHashSet;

use crate::classify::Alignment;
use crate::error::Error;

/// Consecutive records sharing one key, in input order. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadGroup<K, R> {
    pub key: K,
    pub records: Vec<R>,
}

impl<K, R> ReadGroup<K, R> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Key function grouping by query name.
pub fn by_read_name<R: Alignment>(record: &R) -> BString {
    BString::from(record.read_name())
}

/// Iterator adapter turning `Result<R, E>` records into [`ReadGroup`]s.
///
/// Holds at most one record of look-ahead. The first source error ends the
/// iteration after it is yielded.
pub struct ReadGroups<I, F, K, R> {
    records: I,
    key_fn: F,
    pending: Option<(K, R)>,
    seen: Option<FxHashSet<K>>,
    done: bool,
}

impl<I, F, K, R, E> ReadGroups<I, F, K, R>
where
    I: Iterator<Item = Result<R, E>>,
    F: FnMut(&R) -> K,
    K: Eq + Hash + Clone + std::fmt::Debug,
    E: Into<Error>,
{
    pub fn new(records: I, key_fn: F) -> Self {
        Self {
            records,
            key_fn,
            pending: None,
            seen: None,
            done: false,
        }
    }

    /// Fails with [`Error::Precondition`] when a key shows up again after a
    /// different key. Costs one hash-set entry per group.
    pub fn check_contiguity(mut self) -> Self {
        self.seen = Some(FxHashSet::default());
        self
    }

    fn next_keyed(&mut self) -> Option<Result<(K, R), Error>> {
        match self.records.next()? {
            Ok(record) => {
                let key = (self.key_fn)(&record);
                Some(Ok((key, record)))
            }
            Err(e) => Some(Err(e.into())),
        }
    }

    fn open_group(&mut self, key: &K) -> Result<(), Error> {
        if let Some(seen) = self.seen.as_mut() {
            if !seen.insert(key.clone()) {
                return Err(Error::Precondition(format!(
                    "input is not grouped by read name: {:?} reappears after another read",
                    key
                )));
            }
        }
        Ok(())
    }
}

impl<I, F, K, R, E> Iterator for ReadGroups<I, F, K, R>
where
    I: Iterator<Item = Result<R, E>>,
    F: FnMut(&R) -> K,
    K: Eq + Hash + Clone + std::fmt::Debug,
    E: Into<Error>,
{
    type Item = Result<ReadGroup<K, R>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let (key, first) = match self.pending.take() {
            Some(pending) => pending,
            None => match self.next_keyed() {
                Some(Ok(keyed)) => keyed,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    return None;
                }
            },
        };

        if let Err(e) = self.open_group(&key) {
            self.done = true;
            return Some(Err(e));
        }

        let mut records = vec![first];
        loop {
            match self.next_keyed() {
                Some(Ok((next_key, record))) if next_key == key => records.push(record),
                Some(Ok(keyed)) => {
                    self.pending = Some(keyed);
                    break;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => break,
            }
        }

        Some(Ok(ReadGroup { key, records }))
    }
}

/// Groups `records` by read name.
pub fn group_by_read_name<I, R, E>(records: I) -> ReadGroups<I::IntoIter, fn(&R) -> BString, BString, R>
where
    I: IntoIterator<Item = Result<R, E>>,
    R: Alignment,
    E: Into<Error>,
{
    ReadGroups::new(records.into_iter(), by_read_name::<R> as fn(&R) -> BString)
}
