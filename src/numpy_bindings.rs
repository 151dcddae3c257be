use numpy::{IntoPyArray, PyArray1, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use crate::classify::{FlagRecord, GroupClassifier, GroupPolicy};
use crate::error::Error;
use crate::overlaps;
use crate::read_groups::{ReadGroup, ReadGroups};

fn value_error(err: Error) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn check_lengths(name: &str, expected: usize, found: usize) -> PyResult<()> {
    if expected != found {
        return Err(PyValueError::new_err(format!(
            "{} has length {}, expected {}",
            name, found, expected
        )));
    }
    Ok(())
}

/// For every query position, whether it lies within `fuzzy` of an exon
/// boundary on the same (integer-coded) chromosome.
#[pyfunction]
#[pyo3(signature = (chrs, lefts, rights, chrs2, positions, fuzzy=crate::DEFAULT_FUZZY))]
pub fn fuzzy_breakpoint_hits_numpy(
    py: Python,
    chrs: PyReadonlyArray1<i64>,
    lefts: PyReadonlyArray1<i64>,
    rights: PyReadonlyArray1<i64>,
    chrs2: PyReadonlyArray1<i64>,
    positions: PyReadonlyArray1<i64>,
    fuzzy: i64,
) -> PyResult<Py<PyArray1<bool>>> {
    if fuzzy < 0 {
        return Err(value_error(Error::Parameter(format!(
            "fuzzy distance must be >= 0, got {}",
            fuzzy
        ))));
    }

    let chrs_slice = chrs.as_slice()?;
    let lefts_slice = lefts.as_slice()?;
    let rights_slice = rights.as_slice()?;
    let chrs_slice2 = chrs2.as_slice()?;
    let positions_slice = positions.as_slice()?;
    check_lengths("lefts", chrs_slice.len(), lefts_slice.len())?;
    check_lengths("rights", chrs_slice.len(), rights_slice.len())?;
    check_lengths("positions", chrs_slice2.len(), positions_slice.len())?;

    let hits = overlaps::fuzzy_boundary_hits(
        chrs_slice,
        lefts_slice,
        rights_slice,
        chrs_slice2,
        positions_slice,
        fuzzy,
    )
    .map_err(value_error)?;
    Ok(hits.into_pyarray(py).to_owned().into())
}

/// Mask of alignment rows kept by the chimeric filter (`min_quality` unset)
/// or the quality filter. Rows are grouped by consecutive equal `read_codes`.
#[pyfunction]
#[pyo3(signature = (read_codes, secondary, supplementary, mapq, min_quality=None, check_grouping=false))]
pub fn read_group_retention_numpy(
    py: Python,
    read_codes: PyReadonlyArray1<i64>,
    secondary: PyReadonlyArray1<bool>,
    supplementary: PyReadonlyArray1<bool>,
    mapq: PyReadonlyArray1<u8>,
    min_quality: Option<u8>,
    check_grouping: bool,
) -> PyResult<Py<PyArray1<bool>>> {
    let codes = read_codes.as_slice()?;
    let secondary = secondary.as_slice()?;
    let supplementary = supplementary.as_slice()?;
    let mapq = mapq.as_slice()?;
    check_lengths("secondary", codes.len(), secondary.len())?;
    check_lengths("supplementary", codes.len(), supplementary.len())?;
    check_lengths("mapq", codes.len(), mapq.len())?;

    let policy = match min_quality {
        Some(min_quality) => GroupPolicy::Quality { min_quality },
        None => GroupPolicy::Chimeric,
    };
    let mut classifier = GroupClassifier::new(policy);
    let mut keep = vec![false; codes.len()];

    let rows = (0..codes.len()).map(Ok::<usize, Error>);
    let groups = ReadGroups::new(rows, |&i: &usize| codes[i]);
    let groups = if check_grouping {
        groups.check_contiguity()
    } else {
        groups
    };

    for group in groups {
        let group = group.map_err(value_error)?;
        let flags: Vec<FlagRecord> = group
            .records
            .iter()
            .map(|&i| FlagRecord::new(Vec::new(), secondary[i], supplementary[i], mapq[i]))
            .collect();
        let kept = classifier.classify(ReadGroup {
            key: group.key,
            records: flags,
        });
        if kept.is_some() {
            for &i in &group.records {
                keep[i] = true;
            }
        }
    }

    Ok(keep.into_pyarray(py).to_owned().into())
}

#[pymodule]
fn fusion_evidence(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(fuzzy_breakpoint_hits_numpy, m)?)?;
    m.add_function(wrap_pyfunction!(read_group_retention_numpy, m)?)?;
    Ok(())
}
