//! Stop-signal delays per condition and the stop-trial budget split.
//!
//! [`SsdTable`] records, for every subject × level combo, the sorted
//! distinct SSDs of its stop trials. [`SsdTable::resolve`] turns it into the
//! [`SsdInfo`] the simulator consumes for the active fit:
//!
//! - average mode: element-wise mean over the subjects observed in a combo;
//!   subjects mode: the active subject's rows;
//! - flat fits (`nlevels == 1`): rows averaged into a single row;
//! - a combo without stop trials for the unit is skipped by the flat
//!   average and, in conditional fits, takes the flat row;
//! - `nss = ntrials / 2` stop trials, split evenly (floor) over the `nssd`
//!   distinct delays; `ssd_ix` holds `0..nssd` on every row.
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::fitting::{
    core::{
        conditions::ConditionSet,
        data::{TrialData, TrialType},
        options::{AVG_UNIT, FitOn},
    },
    errors::{ConfigError, DataError, FitResult},
};

/// SSD layout handed to the simulator.
///
/// Fields
/// ------
/// - `ssd`: delays, one row per active level combo, one column per SSD
///   position.
/// - `nssd`: number of SSD positions.
/// - `nss`: stop trials simulated per combo (half of `ntrials`).
/// - `nss_per_ssd`: stop trials per delay, `nss / nssd` (floor).
/// - `ssd_ix`: SSD position index grid, same shape as `ssd`.
/// - `filled`: combos without stop trials for the unit, whose row holds
///   the unit's flat delays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsdInfo {
    pub ssd: Array2<f64>,
    pub nssd: usize,
    pub nss: usize,
    pub nss_per_ssd: usize,
    pub ssd_ix: Array2<usize>,
    pub filled: Vec<String>,
}

/// `SsdTable` — distinct SSDs per subject and level combo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsdTable {
    subjects: Vec<String>,
    tags: Vec<String>,
    cells: Vec<Vec<Vec<f64>>>,
}

impl SsdTable {
    /// Collect stop-trial delays of `data` by subject and combo.
    ///
    /// Returns `None` when the data holds no stop trial at all.
    pub fn from_trials(data: &TrialData, conditions: &ConditionSet) -> Option<SsdTable> {
        if !data.has_stop_trials() {
            return None;
        }
        let subjects = data.subjects().to_vec();
        let tags = conditions.level_tags();
        let mut cells: Vec<Vec<Vec<f64>>> = vec![vec![Vec::new(); tags.len()]; subjects.len()];

        for trial in data.trials().iter().filter(|t| t.ttype == TrialType::Stop) {
            let (Some(ssd), Some(combo)) = (trial.ssd, conditions.combo_index(trial)) else {
                continue;
            };
            if let Some(s) = subjects.iter().position(|s| *s == trial.subject) {
                cells[s][combo].push(ssd);
            }
        }
        for cell in cells.iter_mut().flatten() {
            cell.sort_by(f64::total_cmp);
            cell.dedup();
        }

        Some(SsdTable { subjects, tags, cells })
    }

    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// Sorted distinct delays of subject `s` in combo `combo`.
    pub fn cell(&self, s: usize, combo: usize) -> Option<&[f64]> {
        self.cells.get(s).and_then(|row| row.get(combo)).map(Vec::as_slice)
    }

    /// Resolve the SSD layout of the active fit.
    ///
    /// Parameters
    /// ----------
    /// - `fit_on`: pooled or per-subject resolution.
    /// - `ix`: active subject index (subjects mode only).
    /// - `nlevels`: active level count; `1` collapses rows.
    /// - `ntrials`: simulated trial budget.
    ///
    /// Errors
    /// ------
    /// - `ConfigError::IndexOutOfRange` for a bad `ix` in subjects mode.
    /// - `DataError::NoStopTrials` when the unit has no delay in any combo
    ///   (reported against the first combo).
    /// - `DataError::RaggedSsd` when delay counts differ across combos or
    ///   subjects.
    ///
    /// Notes
    /// -----
    /// - Flat fits average the combos the unit has delays for.
    /// - Conditional fits fill a combo without delays with the unit's flat
    ///   row and list it in [`SsdInfo::filled`].
    pub fn resolve(&self, fit_on: FitOn, ix: usize, nlevels: usize, ntrials: usize) -> FitResult<SsdInfo> {
        let (unit, cells) = match fit_on {
            FitOn::Average => (AVG_UNIT.to_string(), self.average_cells()?),
            FitOn::Subjects => {
                let unit = self
                    .subjects
                    .get(ix)
                    .ok_or(ConfigError::IndexOutOfRange { ix, len: self.subjects.len() })?;
                let cells = self.cells[ix].iter().map(|c| (!c.is_empty()).then(|| c.clone())).collect();
                (unit.clone(), cells)
            }
        };

        let flat = self.flat_row(&unit, &cells)?;
        let nssd = flat.len();
        let mut filled = Vec::new();
        let ssd = if nlevels == 1 {
            Array1::from(flat).insert_axis(Axis(0))
        } else {
            let mut values = Vec::with_capacity(cells.len() * nssd);
            for (cell, tag) in cells.iter().zip(&self.tags) {
                match cell {
                    Some(row) => values.extend_from_slice(row),
                    None => {
                        warn!(unit = unit.as_str(), combo = tag.as_str(), "no stop trials; using flat delays");
                        filled.push(tag.clone());
                        values.extend_from_slice(&flat);
                    }
                }
            }
            Array2::from_shape_vec((cells.len(), nssd), values).map_err(|_| DataError::RaggedSsd {
                expected: nssd,
                actual: 0,
                combo: String::new(),
            })?
        };
        let nss = ntrials / 2;
        let nss_per_ssd = nss / nssd;
        let ssd_ix = Array2::from_shape_fn(ssd.raw_dim(), |(_, j)| j);

        debug!(unit = unit.as_str(), nssd, nss, nss_per_ssd, rows = ssd.nrows(), "resolved ssd info");
        Ok(SsdInfo { ssd, nssd, nss, nss_per_ssd, ssd_ix, filled })
    }

    /// Per-combo element-wise mean over the subjects with delays there.
    fn average_cells(&self) -> FitResult<Vec<Option<Vec<f64>>>> {
        let mut means = Vec::with_capacity(self.tags.len());
        for (combo, tag) in self.tags.iter().enumerate() {
            let present: Vec<&Vec<f64>> =
                self.cells.iter().map(|row| &row[combo]).filter(|cell| !cell.is_empty()).collect();
            means.push(mean_row(&present, tag)?);
        }
        Ok(means)
    }

    /// Mean of the combo rows that have delays.
    fn flat_row(&self, unit: &str, cells: &[Option<Vec<f64>>]) -> FitResult<Vec<f64>> {
        let present: Vec<&Vec<f64>> = cells.iter().flatten().collect();
        let Some(first) = present.first() else {
            let combo = self.tags.first().cloned().unwrap_or_default();
            return Err(DataError::NoStopTrials { unit: unit.to_string(), combo }.into());
        };
        for (cell, tag) in cells.iter().zip(&self.tags) {
            if let Some(row) = cell.as_ref().filter(|row| row.len() != first.len()) {
                return Err(
                    DataError::RaggedSsd { expected: first.len(), actual: row.len(), combo: tag.clone() }.into()
                );
            }
        }
        Ok(mean_row(&present, "")?.unwrap_or_default())
    }
}

fn mean_row(rows: &[&Vec<f64>], tag: &str) -> FitResult<Option<Vec<f64>>> {
    let Some(first) = rows.first() else {
        return Ok(None);
    };
    let width = first.len();
    let mut sum = vec![0.0; width];
    for row in rows {
        if row.len() != width {
            return Err(DataError::RaggedSsd { expected: width, actual: row.len(), combo: tag.to_string() }.into());
        }
        sum.iter_mut().zip(row.iter()).for_each(|(acc, x)| *acc += x);
    }
    Ok(Some(sum.into_iter().map(|x| x / rows.len() as f64).collect()))
}
