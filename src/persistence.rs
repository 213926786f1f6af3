//! persistence — delimited records for fitted parameters and fit vectors.
//!
//! Purpose
//! -------
//! Read and write the two plain-text artifacts of a fit:
//!
//! - parameter records: one `name,value` line per parameter, no header;
//! - fit records: header `,y,wts,yhat`, then one `index,y,wts,yhat` line
//!   per element of the observed vector.
//!
//! Conventions
//! -----------
//! - Values are written with Rust's shortest round-trip `f64` formatting,
//!   so a write/read cycle reproduces every value bit for bit.
//! - Readers report 1-based line numbers in `PersistError::Malformed`.
//! - Blank lines are skipped by both readers.
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use ndarray::Array1;
use tracing::debug;

use crate::fitting::errors::{PersistError, PersistResult};

/// Header line of a fit record.
pub const FITS_HEADER: &str = ",y,wts,yhat";

/// Observed, weight and predicted vectors of one fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitRecord {
    pub y: Array1<f64>,
    pub wts: Array1<f64>,
    pub yhat: Array1<f64>,
}

impl FitRecord {
    /// Errors
    /// ------
    /// - `PersistError::LengthMismatch` if the three vectors differ in length.
    pub fn new(y: Array1<f64>, wts: Array1<f64>, yhat: Array1<f64>) -> PersistResult<FitRecord> {
        let record = FitRecord { y, wts, yhat };
        record.check()?;
        Ok(record)
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    fn check(&self) -> PersistResult<()> {
        let (y, wts, yhat) = (self.y.len(), self.wts.len(), self.yhat.len());
        if y != wts || y != yhat {
            return Err(PersistError::LengthMismatch { y, wts, yhat });
        }
        Ok(())
    }
}

/// Write `values` as `name,value` lines.
pub fn write_params<W: Write>(mut writer: W, values: &BTreeMap<String, f64>) -> PersistResult<()> {
    for (name, value) in values {
        writeln!(writer, "{name},{value}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read `name,value` lines.
///
/// Errors
/// ------
/// - `PersistError::Malformed` for a line without a comma, an empty name,
///   an unparsable value or a repeated name.
/// - `PersistError::Io` for reader failures.
pub fn read_params<R: BufRead>(reader: R) -> PersistResult<BTreeMap<String, f64>> {
    let mut values = BTreeMap::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let lineno = i + 1;
        let (name, value) = line
            .split_once(',')
            .ok_or(PersistError::Malformed { line: lineno, reason: "expected `name,value`" })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(PersistError::Malformed { line: lineno, reason: "empty parameter name" });
        }
        let value = parse_value(value, lineno)?;
        if values.insert(name.to_string(), value).is_some() {
            return Err(PersistError::Malformed { line: lineno, reason: "repeated parameter name" });
        }
    }
    Ok(values)
}

/// Write a fit record with its header and index column.
///
/// Errors
/// ------
/// - `PersistError::LengthMismatch` if the record's vectors differ in length.
pub fn write_fits<W: Write>(mut writer: W, record: &FitRecord) -> PersistResult<()> {
    record.check()?;
    writeln!(writer, "{FITS_HEADER}")?;
    for (i, ((y, w), yhat)) in record.y.iter().zip(&record.wts).zip(&record.yhat).enumerate() {
        writeln!(writer, "{i},{y},{w},{yhat}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a fit record.
///
/// Errors
/// ------
/// - `PersistError::Malformed` for a missing or different header, a row
///   without four fields, an index out of sequence or an unparsable value.
pub fn read_fits<R: BufRead>(reader: R) -> PersistResult<FitRecord> {
    let mut lines = reader
        .lines()
        .enumerate()
        .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()));

    let Some((i, header)) = lines.next() else {
        return Err(PersistError::Malformed { line: 1, reason: "missing header" });
    };
    if header?.trim() != FITS_HEADER {
        return Err(PersistError::Malformed { line: i + 1, reason: "expected `,y,wts,yhat` header" });
    }

    let (mut y, mut wts, mut yhat) = (Vec::new(), Vec::new(), Vec::new());
    for (i, line) in lines {
        let line = line?;
        let lineno = i + 1;
        let fields: Vec<&str> = line.trim().split(',').collect();
        let [index, yv, wv, hv] = fields.as_slice() else {
            return Err(PersistError::Malformed { line: lineno, reason: "expected four fields" });
        };
        if index.trim().parse::<usize>().ok() != Some(y.len()) {
            return Err(PersistError::Malformed { line: lineno, reason: "index out of sequence" });
        }
        y.push(parse_value(yv, lineno)?);
        wts.push(parse_value(wv, lineno)?);
        yhat.push(parse_value(hv, lineno)?);
    }
    debug!(rows = y.len(), "read fit record");
    FitRecord::new(Array1::from(y), Array1::from(wts), Array1::from(yhat))
}

/// [`write_params`] into a new file at `path`.
pub fn save_params(path: impl AsRef<Path>, values: &BTreeMap<String, f64>) -> PersistResult<()> {
    write_params(BufWriter::new(File::create(path)?), values)
}

/// [`read_params`] from the file at `path`.
pub fn load_params(path: impl AsRef<Path>) -> PersistResult<BTreeMap<String, f64>> {
    read_params(BufReader::new(File::open(path)?))
}

/// [`write_fits`] into a new file at `path`.
pub fn save_fits(path: impl AsRef<Path>, record: &FitRecord) -> PersistResult<()> {
    write_fits(BufWriter::new(File::create(path)?), record)
}

/// [`read_fits`] from the file at `path`.
pub fn load_fits(path: impl AsRef<Path>) -> PersistResult<FitRecord> {
    read_fits(BufReader::new(File::open(path)?))
}

fn parse_value(text: &str, line: usize) -> PersistResult<f64> {
    text.trim().parse::<f64>().map_err(|_| PersistError::Malformed { line, reason: "unparsable value" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Exact text layout of both record kinds.
    // - Bit-exact read-back of written values.
    // - Malformed inputs with line numbers.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify the parameter record layout and exact read-back.
    //
    // Given
    // -----
    // - {a: 0.1 + 0.2, v_easy: 1.2, tr: 1e-30}.
    //
    // Expect
    // ------
    // - Sorted `name,value` lines without header; reading returns the same
    //   bits.
    fn params_layout_and_readback() {
        let values: BTreeMap<String, f64> = [("a", 0.1 + 0.2), ("v_easy", 1.2), ("tr", 1e-30)]
            .map(|(k, v)| (k.to_string(), v))
            .into();

        let mut buf = Vec::new();
        write_params(&mut buf, &values).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();

        assert_eq!(text, "a,0.30000000000000004\ntr,0.000000000000000000000000000001\nv_easy,1.2\n");
        let back = read_params(buf.as_slice()).unwrap();
        assert_eq!(back, values);
        assert_eq!(back["a"].to_bits(), values["a"].to_bits());
    }

    #[test]
    // Purpose
    // -------
    // Ensure malformed parameter lines are rejected with their line number.
    //
    // Given
    // -----
    // - A value that is not a number on line 2; a repeated name on line 3.
    //
    // Expect
    // ------
    // - `Malformed { line: 2 }` and `Malformed { line: 3 }`.
    fn params_malformed_lines() {
        let err = read_params("a,0.5\nv,fast\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PersistError::Malformed { line: 2, .. }));

        let err = read_params("a,0.5\n\na,0.6\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PersistError::Malformed { line: 3, .. }));
    }

    #[test]
    // Purpose
    // -------
    // Verify the fit record layout, read-back and checks.
    //
    // Given
    // -----
    // - y = [0.9, 0.5], wts = [1.5, 0.5], yhat = [0.85, 0.52].
    //
    // Expect
    // ------
    // - Header `,y,wts,yhat` then indexed rows; identical read-back; a
    //   wrong header or skipped index is malformed; unequal vectors are
    //   rejected on construction.
    fn fits_layout_readback_and_checks() {
        let record = FitRecord::new(array![0.9, 0.5], array![1.5, 0.5], array![0.85, 0.52]).unwrap();

        let mut buf = Vec::new();
        write_fits(&mut buf, &record).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert_eq!(text, ",y,wts,yhat\n0,0.9,1.5,0.85\n1,0.5,0.5,0.52\n");
        assert_eq!(read_fits(buf.as_slice()).unwrap(), record);

        let err = read_fits("y,wts,yhat\n0,1,1,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PersistError::Malformed { line: 1, .. }));
        let err = read_fits(",y,wts,yhat\n0,1,1,1\n2,1,1,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PersistError::Malformed { line: 3, .. }));

        let err = FitRecord::new(array![1.0], array![1.0, 1.0], array![1.0]).unwrap_err();
        assert_eq!(err, PersistError::LengthMismatch { y: 1, wts: 2, yhat: 1 });
    }
}
