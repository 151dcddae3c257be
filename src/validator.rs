use std::fs::File;
use std::path::Path;
use std::time::Instant;

use log::{debug, info};
use polars::prelude::*;

use crate::breakpoint::{parse_row, BreakpointFormat};
use crate::classify::RetentionTally;
use crate::error::Error;
use crate::evidence_structs::FusionBreakpoints;
use crate::interval_index::IntervalIndex;
use crate::table;

/// Accepts a fusion candidate only when both breakpoints sit within fuzzy
/// distance of an annotated exon boundary.
#[derive(Debug, Clone, Copy)]
pub struct BreakpointValidator<'a> {
    index: &'a IntervalIndex,
}

impl<'a> BreakpointValidator<'a> {
    pub fn new(index: &'a IntervalIndex) -> Self {
        Self { index }
    }

    #[inline]
    pub fn accepts(&self, breakpoints: &FusionBreakpoints) -> bool {
        self.index.contains_breakpoint(&breakpoints.left)
            && self.index.contains_breakpoint(&breakpoints.right)
    }

    /// Keeps the rows of `df` whose breakpoints are both accepted, in their
    /// original order. `format` is sniffed from the header when `None`.
    ///
    /// Any row with an unparsable breakpoint fails the whole table.
    pub fn filter_table(
        &self,
        df: &DataFrame,
        format: Option<BreakpointFormat>,
    ) -> Result<(DataFrame, RetentionTally), Error> {
        let format = match format {
            Some(format) => format,
            None => BreakpointFormat::sniff(df.get_column_names().into_iter().map(|c| c.as_str()))?,
        };
        debug!("Reading breakpoints in {} layout", format);

        let mut columns = Vec::with_capacity(format.columns().len());
        for &name in format.columns() {
            if !table::has_column(df, name) {
                return Err(Error::Parameter(format!(
                    "fusion table has no '{}' column required by the {} layout",
                    name, format
                )));
            }
            columns.push(df.column(name)?.str()?);
        }
        let mut cells: Vec<_> = columns.iter().map(|&c| c.into_iter()).collect();

        let mut keep = Vec::with_capacity(df.height());
        let mut tally = RetentionTally::default();
        let mut fields: Vec<Option<&str>> = Vec::with_capacity(cells.len());

        for row in 0..df.height() {
            fields.clear();
            fields.extend(cells.iter_mut().map(|c| c.next().flatten()));

            // line 1 is the header
            let breakpoints = parse_row(format, &fields, row + 2)?;
            let accepted = self.accepts(&breakpoints);
            tally.add(1, accepted as usize);
            keep.push(accepted);
        }

        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        let filtered = df.filter(&mask)?;

        Ok((filtered, tally))
    }
}

/// Reads a fusion candidate table, drops rows without fuzzy exon-boundary
/// support on both sides and writes the rest to `output` (stdout if `None`).
pub fn filter_fusion_file(
    index: &IntervalIndex,
    input: &Path,
    output: Option<&Path>,
    format: Option<BreakpointFormat>,
) -> Result<RetentionTally, Error> {
    let start = Instant::now();

    let df = table::read_fusion_table(input)?;
    let (mut filtered, tally) = BreakpointValidator::new(index).filter_table(&df, format)?;

    match output {
        Some(path) => {
            let file = File::create(path).map_err(|e| Error::io(e, path))?;
            table::write_fusion_table(&mut filtered, file, path)?;
        }
        None => table::write_fusion_table(
            &mut filtered,
            std::io::stdout().lock(),
            Path::new("<stdout>"),
        )?,
    }

    info!(
        "{}/{} fusion candidates have fuzzy exon-boundary support on both breakpoints",
        tally.records_retained, tally.records_processed
    );
    debug!("Time elapsed filtering breakpoints: {:?}", start.elapsed());

    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakpoint::parse_legacy_pair;
    use crate::evidence_structs::ExonBoundary;

    fn index() -> IntervalIndex {
        IntervalIndex::build(
            vec![
                ExonBoundary {
                    chrom: "chr1".to_string(),
                    left: 1000,
                    right: 2000,
                },
                ExonBoundary {
                    chrom: "chr2".to_string(),
                    left: 500,
                    right: 800,
                },
            ],
            5,
        )
        .unwrap()
    }

    fn text_frame(columns: &[(&str, &[&str])]) -> DataFrame {
        let columns: Vec<Column> = columns
            .iter()
            .map(|(name, values)| Column::new((*name).into(), *values))
            .collect();
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn both_breakpoints_must_match() {
        let index = index();
        let validator = BreakpointValidator::new(&index);

        let both = parse_legacy_pair("chr1:1003--chr2:798").unwrap();
        let left_only = parse_legacy_pair("chr1:1003--chr2:650").unwrap();
        let right_only = parse_legacy_pair("chr1:1500--chr2:798").unwrap();
        let unknown = parse_legacy_pair("chr1:1003--chrM:500").unwrap();

        assert!(validator.accepts(&both));
        assert!(!validator.accepts(&left_only));
        assert!(!validator.accepts(&right_only));
        assert!(!validator.accepts(&unknown));
    }

    #[test]
    fn filters_legacy_rows_in_order() {
        let index = index();
        let df = text_frame(&[
            ("#FusionName", &["A--B", "C--D", "E--F", "G--H"]),
            (
                "breakpoint",
                &[
                    "chr1:2005--chr2:500",
                    "chr1:2006--chr2:500",
                    "chr2:800--chr1:995",
                    "chr2:800--chrX:995",
                ],
            ),
        ]);

        let (filtered, tally) = BreakpointValidator::new(&index)
            .filter_table(&df, None)
            .unwrap();

        let names: Vec<Option<&str>> = filtered
            .column("#FusionName")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(names, vec![Some("A--B"), Some("E--F")]);
        assert_eq!(filtered.width(), 2);
        assert_eq!(tally.records_processed, 4);
        assert_eq!(tally.records_retained, 2);
    }

    #[test]
    fn filters_stranded_rows() {
        let index = index();
        let df = text_frame(&[
            ("#FusionName", &["A--B", "C--D"]),
            ("LeftBreakpoint", &["chr1:1000:+", "chr1:1000:+"]),
            ("RightBreakpoint", &["chr2:505:-", "chr2:506:-"]),
        ]);

        let (filtered, _) = BreakpointValidator::new(&index)
            .filter_table(&df, Some(BreakpointFormat::Stranded))
            .unwrap();
        assert_eq!(filtered.height(), 1);
    }

    #[test]
    fn filtering_twice_changes_nothing() {
        let index = index();
        let df = text_frame(&[(
            "breakpoint",
            &["chr1:1000--chr2:500", "chr1:10--chr2:500", "chr2:795--chr1:2003"],
        )]);
        let validator = BreakpointValidator::new(&index);

        let (once, _) = validator.filter_table(&df, None).unwrap();
        let (twice, tally) = validator.filter_table(&once, None).unwrap();
        assert!(once.equals(&twice));
        assert_eq!(tally.records_processed, tally.records_retained);
    }

    #[test]
    fn malformed_row_fails_the_table() {
        let index = index();
        let df = text_frame(&[("breakpoint", &["chr1:1000--chr2:500", "chr1:1000-chr2:500"])]);

        let err = BreakpointValidator::new(&index)
            .filter_table(&df, None)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { line: 3, .. }));
    }

    #[test]
    fn forced_layout_needs_its_columns() {
        let index = index();
        let df = text_frame(&[("breakpoint", &["chr1:1000--chr2:500"])]);
        let err = BreakpointValidator::new(&index)
            .filter_table(&df, Some(BreakpointFormat::Stranded))
            .unwrap_err();
        assert!(matches!(err, Error::Parameter(_)));
    }
}
