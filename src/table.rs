use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;
use std::sync::Arc;

use flate2::read::MultiGzDecoder;
use polars::datatypes::DataType;
use polars::prelude::*;

use crate::error::Error;
use crate::evidence_structs::ExonBoundary;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Reads a whole file, transparently inflating it when it is gzipped.
fn read_maybe_gzipped(path: &Path) -> Result<Vec<u8>, Error> {
    let bytes = std::fs::read(path).map_err(|e| Error::io(e, path))?;
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes);
    }

    let mut inflated = Vec::new();
    MultiGzDecoder::new(&bytes[..])
        .read_to_end(&mut inflated)
        .map_err(|e| Error::io(e, path))?;
    Ok(inflated)
}

/// Reference exon table: `chrom \t left \t right`, no header.
pub fn read_exon_boundaries(path: &Path) -> Result<Vec<ExonBoundary>, Error> {
    let bytes = read_maybe_gzipped(path)?;
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Vec::new());
    }

    let columns = Arc::new(vec![0, 1, 2]);
    let parse_options: CsvParseOptions = CsvParseOptions::default().with_separator(b'\t');
    let fields = vec![
        Field::new("column_1".into(), DataType::String),
        Field::new("column_2".into(), DataType::Int64),
        Field::new("column_3".into(), DataType::Int64),
    ];
    let schema = Schema::from_iter(fields);

    let df = CsvReadOptions::default()
        .with_has_header(false)
        .with_schema_overwrite(Some(Arc::new(schema)))
        .with_projection(Some(columns))
        .with_rechunk(true)
        .with_parse_options(parse_options)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    let chroms = df.column("column_1")?.str()?;
    let lefts = df.column("column_2")?.i64()?;
    let rights = df.column("column_3")?.i64()?;

    let mut boundaries = Vec::with_capacity(df.height());
    for (i, ((chrom, left), right)) in chroms
        .into_iter()
        .zip(lefts.into_iter())
        .zip(rights.into_iter())
        .enumerate()
    {
        match (chrom, left, right) {
            (Some(chrom), Some(left), Some(right)) => boundaries.push(ExonBoundary {
                chrom: chrom.to_string(),
                left,
                right,
            }),
            _ => {
                return Err(Error::malformed(
                    i + 1,
                    format!("missing field in reference exon table {}", path.display()),
                ))
            }
        }
    }

    Ok(boundaries)
}

/// Fusion candidate table with a header line. Every column is kept as a
/// string and quotes are ordinary characters, so rows are written back
/// exactly as they were read.
pub fn read_fusion_table(path: &Path) -> Result<DataFrame, Error> {
    let file = File::open(path).map_err(|e| Error::io(e, path))?;
    let parse_options: CsvParseOptions = CsvParseOptions::default()
        .with_separator(b'\t')
        .with_quote_char(None);

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(parse_options)
        .into_reader_with_file_handle(file)
        .finish()?;

    Ok(df)
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

/// Writes `df` as a tab-separated table without quoting. `dest` names the
/// destination in errors.
pub fn write_fusion_table<W: Write>(
    df: &mut DataFrame,
    writer: W,
    dest: &Path,
) -> Result<(), Error> {
    let mut writer = BufWriter::new(writer);
    CsvWriter::new(&mut writer)
        .include_header(true)
        .with_separator(b'\t')
        .with_quote_style(QuoteStyle::Never)
        .finish(df)?;
    writer.flush().map_err(|e| Error::io(e, dest))?;
    Ok(())
}
