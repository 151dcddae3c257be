//! Streaming BAM filters over read groups (noodles)
use std::borrow::Cow;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;

use log::{debug, info, warn};
use noodles::bam;
use noodles::sam;
use noodles::sam::alignment::io::Write as SamWrite;
use noodles::sam::header::record::value::map::header::tag;

use crate::classify::{GroupClassifier, GroupPolicy, RetentionTally};
use crate::error::Error;
use crate::read_groups::group_by_read_name;

/// `@HD SO` value each policy expects its input to carry.
pub fn expected_sort_order(policy: GroupPolicy) -> &'static str {
    match policy {
        GroupPolicy::Chimeric => "unsorted",
        GroupPolicy::Quality { .. } => "queryname",
    }
}

/// The `SO` field of the `@HD` line, if any.
pub fn sort_order(header: &sam::Header) -> Option<Cow<'_, str>> {
    header
        .header()?
        .other_fields()
        .get(&tag::SORT_ORDER)
        .map(|value| String::from_utf8_lossy(value))
}

/// Fails with [`Error::Precondition`] unless the header carries the sort
/// order `policy` expects. With `allow_any` a mismatch is only logged.
pub fn check_sort_order(
    header: &sam::Header,
    policy: GroupPolicy,
    path: &Path,
    allow_any: bool,
) -> Result<(), Error> {
    let expected = expected_sort_order(policy);
    let found = match sort_order(header) {
        Some(found) if found == expected => return Ok(()),
        Some(found) => format!("SO:{}", found),
        None => "no @HD sort order".to_string(),
    };

    if allow_any {
        warn!(
            "{} has {}, expected SO:{}; reads split across the file are filtered piecewise",
            path.display(),
            found,
            expected
        );
        return Ok(());
    }

    Err(Error::Precondition(format!(
        "{} has {}, expected SO:{} (pass --allow-any-sort-order to filter it anyway)",
        path.display(),
        found,
        expected
    )))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Fail when a read name reappears after another read.
    pub check_grouping: bool,
    /// Accept inputs whose `@HD SO` differs from the expected one.
    pub allow_any_sort_order: bool,
}

/// Copies the read groups of `input` that pass `policy` to `output`.
///
/// The input must be grouped by read name and carry the sort order of
/// [`expected_sort_order`]; see [`FilterOptions`] for the checks.
pub fn filter_bam(
    input: &Path,
    output: &Path,
    policy: GroupPolicy,
    options: FilterOptions,
) -> Result<RetentionTally, Error> {
    let start = Instant::now();

    let mut reader = File::open(input)
        .map(bam::io::Reader::new)
        .map_err(|e| Error::io(e, input))?;
    let header = reader.read_header().map_err(|e| Error::io(e, input))?;
    check_sort_order(&header, policy, input, options.allow_any_sort_order)?;

    let file = File::create(output).map_err(|e| Error::io(e, output))?;
    let mut writer = bam::io::Writer::new(BufWriter::new(file));
    writer
        .write_header(&header)
        .map_err(|e| Error::io(e, output))?;

    let records = reader
        .records()
        .map(|record| record.map_err(|e| Error::io(e, input)));
    let groups = group_by_read_name(records);
    let groups = if options.check_grouping {
        groups.check_contiguity()
    } else {
        groups
    };

    let mut classifier = GroupClassifier::new(policy);
    for group in groups {
        if let Some(records) = classifier.classify(group?) {
            for record in &records {
                writer
                    .write_alignment_record(&header, record)
                    .map_err(|e| Error::io(e, output))?;
            }
        }
    }

    writer
        .finish(&header)
        .map_err(|e| Error::io(e, output))?;

    let tally = classifier.tally();
    info!(
        "Kept {}/{} alignment records of {}",
        tally.records_retained,
        tally.records_processed,
        input.display()
    );
    debug!("Time elapsed filtering alignments: {:?}", start.elapsed());

    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use noodles::sam::alignment::record::{Flags, MappingQuality};
    use noodles::sam::alignment::RecordBuf;
    use tempfile::TempDir;

    fn record(name: &str, flags: Flags, mapq: u8) -> RecordBuf {
        RecordBuf::builder()
            .set_name(name)
            .set_flags(Flags::UNMAPPED | flags)
            .set_mapping_quality(MappingQuality::new(mapq).unwrap())
            .build()
    }

    fn header(sort_order: &str) -> sam::Header {
        format!("@HD\tVN:1.6\tSO:{}\n", sort_order).parse().unwrap()
    }

    fn write_bam(path: &Path, header: &sam::Header, records: &[RecordBuf]) {
        let mut writer = bam::io::Writer::new(BufWriter::new(File::create(path).unwrap()));
        writer.write_header(header).unwrap();
        for record in records {
            writer.write_alignment_record(header, record).unwrap();
        }
        writer.finish(header).unwrap();
    }

    fn checked(check_grouping: bool) -> FilterOptions {
        FilterOptions {
            check_grouping,
            allow_any_sort_order: false,
        }
    }

    fn read_names(path: &Path) -> Vec<String> {
        let mut reader = File::open(path).map(bam::io::Reader::new).unwrap();
        reader.read_header().unwrap();
        reader
            .records()
            .map(|r| {
                let r = r.unwrap();
                String::from_utf8_lossy(crate::classify::Alignment::read_name(&r)).to_string()
            })
            .collect()
    }

    fn input() -> Vec<RecordBuf> {
        vec![
            record("a", Flags::empty(), 60),
            record("a", Flags::SUPPLEMENTARY, 60),
            record("b", Flags::empty(), 5),
            record("b", Flags::SECONDARY, 60),
            record("c", Flags::empty(), 30),
        ]
    }

    #[test]
    fn chimeric_filter_keeps_split_reads() {
        let dir = TempDir::new().unwrap();
        let (src, dst) = (dir.path().join("in.bam"), dir.path().join("out.bam"));
        write_bam(&src, &header("unsorted"), &input());

        let tally = filter_bam(&src, &dst, GroupPolicy::Chimeric, checked(false)).unwrap();
        assert_eq!(tally.records_processed, 5);
        assert_eq!(tally.records_retained, 2);
        assert_eq!(read_names(&dst), vec!["a", "a"]);
    }

    #[test]
    fn quality_filter_keeps_confident_reads() {
        let dir = TempDir::new().unwrap();
        let (src, dst) = (dir.path().join("in.bam"), dir.path().join("out.bam"));
        write_bam(&src, &header("queryname"), &input());

        let policy = GroupPolicy::Quality { min_quality: 20 };
        let tally = filter_bam(&src, &dst, policy, checked(true)).unwrap();
        assert_eq!(tally.records_retained, 3);
        assert_eq!(read_names(&dst), vec!["a", "a", "c"]);
    }

    #[test]
    fn ungrouped_input_fails_when_checked() {
        let dir = TempDir::new().unwrap();
        let (src, dst) = (dir.path().join("in.bam"), dir.path().join("out.bam"));
        write_bam(
            &src,
            &header("unsorted"),
            &[
                record("a", Flags::empty(), 60),
                record("b", Flags::empty(), 60),
                record("a", Flags::SUPPLEMENTARY, 60),
            ],
        );

        let err = filter_bam(&src, &dst, GroupPolicy::Chimeric, checked(true)).unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn missing_input_names_the_path() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("absent.bam");
        let err = filter_bam(
            &src,
            &dir.path().join("out.bam"),
            GroupPolicy::Chimeric,
            checked(false),
        )
        .unwrap_err();
        assert!(err.to_string().contains("absent.bam"));
    }

    #[test]
    fn wrong_sort_order_is_a_precondition_failure() {
        let dir = TempDir::new().unwrap();
        let (src, dst) = (dir.path().join("in.bam"), dir.path().join("out.bam"));
        write_bam(&src, &header("coordinate"), &input());

        let policy = GroupPolicy::Quality { min_quality: 20 };
        let err = filter_bam(&src, &dst, policy, checked(false)).unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
        let msg = err.to_string();
        assert!(msg.contains("SO:coordinate"));
        assert!(msg.contains("SO:queryname"));
        assert!(msg.contains("--allow-any-sort-order"));
        assert!(!dst.exists());
    }

    #[test]
    fn missing_sort_order_is_a_precondition_failure() {
        let dir = TempDir::new().unwrap();
        let (src, dst) = (dir.path().join("in.bam"), dir.path().join("out.bam"));
        write_bam(&src, &sam::Header::default(), &input());

        let err = filter_bam(&src, &dst, GroupPolicy::Chimeric, checked(false)).unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
        assert!(err.to_string().contains("no @HD sort order"));
    }

    #[test]
    fn any_sort_order_is_filtered_when_allowed() {
        let dir = TempDir::new().unwrap();
        let (src, dst) = (dir.path().join("in.bam"), dir.path().join("out.bam"));
        write_bam(&src, &header("queryname"), &input());

        let options = FilterOptions {
            check_grouping: false,
            allow_any_sort_order: true,
        };
        let tally = filter_bam(&src, &dst, GroupPolicy::Chimeric, options).unwrap();
        assert_eq!(tally.records_retained, 2);
        assert_eq!(read_names(&dst), vec!["a", "a"]);
    }

    #[test]
    fn sort_order_is_read_from_the_hd_line() {
        assert!(sort_order(&sam::Header::default()).is_none());
        assert_eq!(sort_order(&header("queryname")).as_deref(), Some("queryname"));
        assert_eq!(expected_sort_order(GroupPolicy::Chimeric), "unsorted");
        assert_eq!(
            expected_sort_order(GroupPolicy::Quality { min_quality: 1 }),
            "queryname"
        );
    }
}
