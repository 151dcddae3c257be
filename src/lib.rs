pub mod error;
pub mod params;

pub mod bam;
pub mod breakpoint;
pub mod classify;
pub mod evidence_structs;
pub mod interval_index;
pub mod overlaps;
pub mod read_groups;
pub mod sorts;
pub mod table;
pub mod validator;

#[cfg(feature = "python")]
mod numpy_bindings;

use std::path::Path;

use log::info;

use crate::bam::FilterOptions;
use crate::classify::GroupPolicy;
use crate::interval_index::IntervalIndex;
use crate::params::{Command, Parameters};

/// Distance a breakpoint may sit from an exon boundary and still match.
pub const DEFAULT_FUZZY: i64 = 5;

/// Top-level dispatcher. Called from `main()` after CLI parsing.
pub fn run(params: &Parameters) -> anyhow::Result<()> {
    params.validate()?;

    info!("fusion_evidence v{}", env!("CARGO_PKG_VERSION"));
    info!("command: {}", params.command.name());

    match &params.command {
        Command::FuzzyBreakpoints {
            ref_exons,
            fusions,
            output,
            fuzzy,
            format,
        } => {
            let index = IntervalIndex::from_path(ref_exons, *fuzzy)?;
            validator::filter_fusion_file(
                &index,
                fusions,
                output.as_deref(),
                format.breakpoint_format(),
            )?;
        }
        Command::Chimeric {
            input_bam,
            output_bam,
            check_grouping,
            allow_any_sort_order,
        } => filter_alignments(
            input_bam,
            output_bam,
            GroupPolicy::Chimeric,
            FilterOptions {
                check_grouping: *check_grouping,
                allow_any_sort_order: *allow_any_sort_order,
            },
        )?,
        Command::Quality {
            input_namesorted_bam,
            output_bam,
            min_quality,
            check_grouping,
            allow_any_sort_order,
        } => filter_alignments(
            input_namesorted_bam,
            output_bam,
            GroupPolicy::Quality {
                min_quality: *min_quality,
            },
            FilterOptions {
                check_grouping: *check_grouping,
                allow_any_sort_order: *allow_any_sort_order,
            },
        )?,
    }

    Ok(())
}

fn filter_alignments(
    input: &Path,
    output: &Path,
    policy: GroupPolicy,
    options: FilterOptions,
) -> anyhow::Result<()> {
    let tally = bam::filter_bam(input, output, policy, options)?;
    println!("{}", tally);
    Ok(())
}
