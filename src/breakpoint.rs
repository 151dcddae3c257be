//! Breakpoint descriptors of fusion candidates.
//!
//! Two layouts are in use:
//! - legacy: one `breakpoint` column, `chrL:posL--chrR:posR`
//! - stranded: `LeftBreakpoint` and `RightBreakpoint` columns, each
//!   `chr:pos:strand`

use std::fmt;

use crate::error::Error;
use crate::evidence_structs::{BreakpointDescriptor, FusionBreakpoints, Strand};

pub const LEGACY_COLUMN: &str = "breakpoint";
pub const LEFT_COLUMN: &str = "LeftBreakpoint";
pub const RIGHT_COLUMN: &str = "RightBreakpoint";

const PAIR_DELIMITER: &str = "--";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointFormat {
    Legacy,
    Stranded,
}

impl BreakpointFormat {
    /// Picks the layout from the table's header columns. The stranded
    /// layout wins when both are present.
    pub fn sniff<'a, I>(columns: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let (mut left, mut right, mut legacy) = (false, false, false);
        for column in columns {
            match column {
                LEFT_COLUMN => left = true,
                RIGHT_COLUMN => right = true,
                LEGACY_COLUMN => legacy = true,
                _ => {}
            }
        }

        if left && right {
            Ok(BreakpointFormat::Stranded)
        } else if legacy {
            Ok(BreakpointFormat::Legacy)
        } else {
            Err(Error::Parameter(format!(
                "fusion table has neither a '{}' column nor '{}' and '{}' columns",
                LEGACY_COLUMN, LEFT_COLUMN, RIGHT_COLUMN
            )))
        }
    }

    /// Columns this layout reads, in (left, right) order.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            BreakpointFormat::Legacy => &[LEGACY_COLUMN],
            BreakpointFormat::Stranded => &[LEFT_COLUMN, RIGHT_COLUMN],
        }
    }
}

impl fmt::Display for BreakpointFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakpointFormat::Legacy => write!(f, "legacy"),
            BreakpointFormat::Stranded => write!(f, "stranded"),
        }
    }
}

fn parse_coordinate(value: &str, field: &str) -> Result<i64, String> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("non-numeric coordinate '{}' in '{}'", value, field))
}

/// `chrom:coordinate`
pub fn parse_unstranded(field: &str) -> Result<BreakpointDescriptor, String> {
    let (chrom, coordinate) = field
        .rsplit_once(':')
        .ok_or_else(|| format!("missing ':' in breakpoint '{}'", field))?;
    if chrom.is_empty() {
        return Err(format!("missing chromosome in breakpoint '{}'", field));
    }

    Ok(BreakpointDescriptor {
        chrom: chrom.to_string(),
        coordinate: parse_coordinate(coordinate, field)?,
        strand: None,
    })
}

/// `chrom:coordinate:strand`
pub fn parse_stranded(field: &str) -> Result<BreakpointDescriptor, String> {
    let mut parts = field.rsplitn(3, ':');
    let (strand, coordinate, chrom) = match (parts.next(), parts.next(), parts.next()) {
        (Some(strand), Some(coordinate), Some(chrom)) if !chrom.is_empty() => {
            (strand, coordinate, chrom)
        }
        _ => return Err(format!("expected chrom:coord:strand, got '{}'", field)),
    };
    let strand = Strand::from_symbol(strand)
        .ok_or_else(|| format!("invalid strand '{}' in breakpoint '{}'", strand, field))?;

    Ok(BreakpointDescriptor {
        chrom: chrom.to_string(),
        coordinate: parse_coordinate(coordinate, field)?,
        strand: Some(strand),
    })
}

/// `chromL:coordL--chromR:coordR`
pub fn parse_legacy_pair(field: &str) -> Result<FusionBreakpoints, String> {
    let mut sides = field.split(PAIR_DELIMITER);
    match (sides.next(), sides.next(), sides.next()) {
        (Some(left), Some(right), None) => Ok(FusionBreakpoints {
            left: parse_unstranded(left)?,
            right: parse_unstranded(right)?,
        }),
        _ => Err(format!(
            "expected two breakpoints joined by '{}', got '{}'",
            PAIR_DELIMITER, field
        )),
    }
}

/// Parses the breakpoint cells of one row. `fields` holds the cells of
/// [`BreakpointFormat::columns`] in order; `line` is only used for errors.
pub fn parse_row(
    format: BreakpointFormat,
    fields: &[Option<&str>],
    line: usize,
) -> Result<FusionBreakpoints, Error> {
    let parsed = match format {
        BreakpointFormat::Legacy => parse_legacy_pair(cell(format, fields, 0, line)?),
        BreakpointFormat::Stranded => {
            let left = parse_stranded(cell(format, fields, 0, line)?);
            let right = parse_stranded(cell(format, fields, 1, line)?);
            left.and_then(|left| right.map(|right| FusionBreakpoints { left, right }))
        }
    };

    parsed.map_err(|reason| Error::malformed(line, reason))
}

fn cell<'a>(
    format: BreakpointFormat,
    fields: &[Option<&'a str>],
    i: usize,
    line: usize,
) -> Result<&'a str, Error> {
    match fields.get(i).copied().flatten() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::malformed(
            line,
            format!("empty '{}' field", format.columns()[i]),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_layouts() {
        assert_eq!(
            BreakpointFormat::sniff(["#FusionName", "breakpoint", "num_LR"]).unwrap(),
            BreakpointFormat::Legacy
        );
        assert_eq!(
            BreakpointFormat::sniff(["#FusionName", "LeftBreakpoint", "RightBreakpoint"]).unwrap(),
            BreakpointFormat::Stranded
        );
        assert_eq!(
            BreakpointFormat::sniff(["breakpoint", "LeftBreakpoint", "RightBreakpoint"]).unwrap(),
            BreakpointFormat::Stranded
        );
        assert!(BreakpointFormat::sniff(["#FusionName", "LeftBreakpoint"]).is_err());
    }

    #[test]
    fn parses_legacy_pair() {
        let bp = parse_legacy_pair("chr12:6534516--chr7:55019365").unwrap();
        assert_eq!(bp.left.chrom, "chr12");
        assert_eq!(bp.left.coordinate, 6534516);
        assert_eq!(bp.right.chrom, "chr7");
        assert_eq!(bp.right.coordinate, 55019365);
        assert_eq!(bp.right.strand, None);
    }

    #[test]
    fn parses_stranded() {
        let bp = parse_stranded("chr21:38380027:-").unwrap();
        assert_eq!(
            bp,
            BreakpointDescriptor {
                chrom: "chr21".to_string(),
                coordinate: 38380027,
                strand: Some(Strand::Reverse),
            }
        );
    }

    #[test]
    fn chromosome_may_contain_colons() {
        let bp = parse_stranded("HLA-A*01:01:01:01:1200:+").unwrap();
        assert_eq!(bp.chrom, "HLA-A*01:01:01:01");
        assert_eq!(bp.coordinate, 1200);
    }

    #[test]
    fn rejects_malformed_descriptors() {
        assert!(parse_legacy_pair("chr1:100").is_err());
        assert!(parse_legacy_pair("chr1:100--chr2:200--chr3:300").is_err());
        assert!(parse_legacy_pair("chr1:abc--chr2:200").is_err());
        assert!(parse_legacy_pair("chr1100--chr2:200").is_err());
        assert!(parse_stranded("chr1:100").is_err());
        assert!(parse_stranded("chr1:100:*").is_err());
        assert!(parse_stranded(":100:+").is_err());
    }

    #[test]
    fn row_errors_name_the_line() {
        let err = parse_row(BreakpointFormat::Legacy, &[Some("chr1:x--chr2:5")], 7).unwrap_err();
        match err {
            Error::MalformedRecord { line, reason } => {
                assert_eq!(line, 7);
                assert!(reason.contains("chr1:x"));
            }
            other => panic!("unexpected error {:?}", other),
        }

        let err = parse_row(BreakpointFormat::Stranded, &[Some("chr1:5:+"), None], 3).unwrap_err();
        assert!(err.to_string().contains("RightBreakpoint"));
    }

    #[test]
    fn parses_stranded_row() {
        let bp = parse_row(
            BreakpointFormat::Stranded,
            &[Some("chr1:100:+"), Some("chr2:200:-")],
            1,
        )
        .unwrap();
        assert_eq!(bp.left.strand, Some(Strand::Forward));
        assert_eq!(bp.right.coordinate, 200);
    }
}
