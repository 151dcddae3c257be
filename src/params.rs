use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::breakpoint::BreakpointFormat;
use crate::error::Error;
use crate::DEFAULT_FUZZY;

/// Breakpoint column layout of the fusion table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Sniff from the header
    Auto,
    /// `breakpoint` column, `chrL:posL--chrR:posR`
    Legacy,
    /// `LeftBreakpoint` / `RightBreakpoint` columns, `chr:pos:strand`
    Stranded,
}

impl FormatArg {
    pub fn breakpoint_format(self) -> Option<BreakpointFormat> {
        match self {
            Self::Auto => None,
            Self::Legacy => Some(BreakpointFormat::Legacy),
            Self::Stranded => Some(BreakpointFormat::Stranded),
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "fusion_evidence", version, about = "Evidence filters for gene fusion calling")]
pub struct Parameters {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Keep fusion candidates whose two breakpoints both lie near annotated exon boundaries
    FuzzyBreakpoints {
        /// Reference exons, `chrom\tleft\tright` without header (may be gzipped)
        #[arg(long)]
        ref_exons: PathBuf,

        /// Fusion candidate table with header
        #[arg(long)]
        fusions: PathBuf,

        /// Filtered table; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,

        /// Allowed distance between a breakpoint and an exon boundary
        #[arg(long, default_value_t = DEFAULT_FUZZY, allow_negative_numbers = true)]
        fuzzy: i64,

        #[arg(long, value_enum, default_value_t = FormatArg::Auto)]
        format: FormatArg,
    },

    /// Keep reads with at least two alignments, one of them supplementary
    Chimeric {
        /// BAM grouped by read name, as written by the aligner (@HD SO:unsorted)
        #[arg(long)]
        input_bam: PathBuf,

        #[arg(long)]
        output_bam: PathBuf,

        /// Fail if a read name reappears after another read
        #[arg(long)]
        check_grouping: bool,

        /// Filter even when the @HD sort order is not the expected one
        #[arg(long)]
        allow_any_sort_order: bool,
    },

    /// Keep reads whose best primary alignment reaches a mapping quality
    Quality {
        /// Name-sorted BAM (@HD SO:queryname)
        #[arg(long)]
        input_namesorted_bam: PathBuf,

        #[arg(long)]
        output_bam: PathBuf,

        /// Minimum mapping quality of the best primary alignment, 0 to 255
        #[arg(short = 'Q', long)]
        min_quality: u8,

        /// Fail if a read name reappears after another read
        #[arg(long)]
        check_grouping: bool,

        /// Filter even when the @HD sort order is not the expected one
        #[arg(long)]
        allow_any_sort_order: bool,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FuzzyBreakpoints { .. } => "fuzzy-breakpoints",
            Self::Chimeric { .. } => "chimeric",
            Self::Quality { .. } => "quality",
        }
    }
}

impl Parameters {
    pub fn validate(&self) -> Result<(), Error> {
        match &self.command {
            Command::FuzzyBreakpoints { fuzzy, .. } if *fuzzy < 0 => Err(Error::Parameter(
                format!("--fuzzy must be >= 0, got {}", fuzzy),
            )),
            Command::Chimeric {
                input_bam,
                output_bam,
                ..
            } if input_bam == output_bam => Err(Error::Parameter(
                "--output-bam must differ from --input-bam".into(),
            )),
            Command::Quality {
                input_namesorted_bam,
                output_bam,
                ..
            } if input_namesorted_bam == output_bam => Err(Error::Parameter(
                "--output-bam must differ from --input-namesorted-bam".into(),
            )),
            _ => Ok(()),
        }
    }
}
