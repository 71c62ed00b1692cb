//! Date-aligned table of `f64` columns.
//!
//! A [`Frame`] carries a strictly increasing, deduplicated date index and one
//! value vector per column, all the same length. Missing values are `NaN`.
//! Every alignment step used by the generators and the engine is an explicit
//! method here; nothing aligns implicitly.

use crate::domain::calendar::{month_end, month_key};
use crate::domain::error::FrameError;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone)]
pub struct Frame {
    index: Vec<NaiveDate>,
    columns: Vec<String>,
    data: Vec<Vec<f64>>,
}

fn check_index(index: &[NaiveDate]) -> Result<(), FrameError> {
    match index.windows(2).position(|w| w[0] >= w[1]) {
        Some(i) => Err(FrameError::UnsortedIndex { position: i + 1 }),
        None => Ok(()),
    }
}

fn check_columns(columns: &[String]) -> Result<(), FrameError> {
    let mut seen = HashSet::with_capacity(columns.len());
    for name in columns {
        if !seen.insert(name.as_str()) {
            return Err(FrameError::DuplicateColumn(name.clone()));
        }
    }
    Ok(())
}

impl Frame {
    /// Build a frame from column-major data. The index must already be
    /// strictly increasing; use [`Frame::from_rows`] for raw observations.
    pub fn new(
        index: Vec<NaiveDate>,
        columns: Vec<String>,
        data: Vec<Vec<f64>>,
    ) -> Result<Self, FrameError> {
        if columns.len() != data.len() {
            return Err(FrameError::ColumnCount {
                expected: columns.len(),
                actual: data.len(),
            });
        }
        for (name, values) in columns.iter().zip(&data) {
            if values.len() != index.len() {
                return Err(FrameError::LengthMismatch {
                    column: name.clone(),
                    expected: index.len(),
                    actual: values.len(),
                });
            }
        }
        check_index(&index)?;
        check_columns(&columns)?;
        Ok(Self {
            index,
            columns,
            data,
        })
    }

    /// Build a frame from row observations in any order. Rows are sorted by
    /// date (stable) and a repeated date keeps its last observation.
    pub fn from_rows(
        columns: Vec<String>,
        mut rows: Vec<(NaiveDate, Vec<f64>)>,
    ) -> Result<Self, FrameError> {
        check_columns(&columns)?;
        for (i, (_, values)) in rows.iter().enumerate() {
            if values.len() != columns.len() {
                return Err(FrameError::RowWidth {
                    row: i,
                    expected: columns.len(),
                    actual: values.len(),
                });
            }
        }
        rows.sort_by_key(|(date, _)| *date);

        let mut index: Vec<NaiveDate> = Vec::with_capacity(rows.len());
        let mut data: Vec<Vec<f64>> = vec![Vec::with_capacity(rows.len()); columns.len()];
        for (date, values) in rows {
            if index.last() == Some(&date) {
                for (col, v) in data.iter_mut().zip(values) {
                    if let Some(slot) = col.last_mut() {
                        *slot = v;
                    }
                }
                continue;
            }
            index.push(date);
            for (col, v) in data.iter_mut().zip(values) {
                col.push(v);
            }
        }

        Ok(Self {
            index,
            columns,
            data,
        })
    }

    /// Single-column frame from (date, value) observations.
    pub fn from_series(
        name: impl Into<String>,
        points: Vec<(NaiveDate, f64)>,
    ) -> Result<Self, FrameError> {
        let rows = points.into_iter().map(|(d, v)| (d, vec![v])).collect();
        Self::from_rows(vec![name.into()], rows)
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.column_position(name).map(|i| self.data[i].as_slice())
    }

    pub fn column_at(&self, position: usize) -> &[f64] {
        &self.data[position]
    }

    pub fn value(&self, row: usize, column: usize) -> f64 {
        self.data[column][row]
    }

    pub fn row(&self, row: usize) -> Vec<f64> {
        self.data.iter().map(|col| col[row]).collect()
    }

    /// Apply `f` to every column, keeping index and names. `f` must return
    /// as many values as it is given.
    pub fn map_values(&self, f: impl Fn(&[f64]) -> Vec<f64>) -> Frame {
        Frame {
            index: self.index.clone(),
            columns: self.columns.clone(),
            data: self.data.iter().map(|col| f(col.as_slice())).collect(),
        }
    }

    /// Carry the last defined value of each column over later `NaN`s.
    /// Leading `NaN`s stay undefined.
    pub fn forward_fill(&self) -> Frame {
        self.map_values(|col| {
            let mut last = f64::NAN;
            col.iter()
                .map(|&v| {
                    if !v.is_nan() {
                        last = v;
                    }
                    last
                })
                .collect()
        })
    }

    /// Replace every `NaN` with `value`.
    pub fn fill_missing(&self, value: f64) -> Frame {
        self.map_values(|col| {
            col.iter()
                .map(|&v| if v.is_nan() { value } else { v })
                .collect()
        })
    }

    /// Drop rows where every column is `NaN`.
    pub fn drop_empty_rows(&self) -> Frame {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| self.data.iter().any(|col| !col[i].is_nan()))
            .collect();
        self.take_rows(&keep)
    }

    fn take_rows(&self, rows: &[usize]) -> Frame {
        Frame {
            index: rows.iter().map(|&i| self.index[i]).collect(),
            columns: self.columns.clone(),
            data: self
                .data
                .iter()
                .map(|col| rows.iter().map(|&i| col[i]).collect())
                .collect(),
        }
    }

    /// Exact-date reindex: dates absent from this frame become `NaN` rows,
    /// dates absent from `index` are dropped.
    pub fn reindex(&self, index: &[NaiveDate]) -> Result<Frame, FrameError> {
        check_index(index)?;
        let positions: Vec<Option<usize>> = index
            .iter()
            .map(|d| self.index.binary_search(d).ok())
            .collect();
        let data = self
            .data
            .iter()
            .map(|col| {
                positions
                    .iter()
                    .map(|p| p.map_or(f64::NAN, |i| col[i]))
                    .collect()
            })
            .collect();
        Ok(Frame {
            index: index.to_vec(),
            columns: self.columns.clone(),
            data,
        })
    }

    /// Select `columns` in the given order; unknown names become all-`NaN`.
    pub fn reindex_columns(&self, columns: &[String]) -> Result<Frame, FrameError> {
        check_columns(columns)?;
        let data = columns
            .iter()
            .map(|name| match self.column(name) {
                Some(values) => values.to_vec(),
                None => vec![f64::NAN; self.len()],
            })
            .collect();
        Ok(Frame {
            index: self.index.clone(),
            columns: columns.to_vec(),
            data,
        })
    }

    /// Move every value `periods` rows later; the first `periods` rows
    /// become `NaN`.
    pub fn shift(&self, periods: usize) -> Frame {
        self.map_values(|col| {
            (0..col.len())
                .map(|i| if i >= periods { col[i - periods] } else { f64::NAN })
                .collect()
        })
    }

    /// Simple return over `periods` rows: `v[t] / v[t - periods] - 1`.
    /// Undefined when either end is missing.
    pub fn pct_change(&self, periods: usize) -> Frame {
        self.map_values(|col| {
            (0..col.len())
                .map(|i| {
                    if i < periods {
                        return f64::NAN;
                    }
                    let prev = col[i - periods];
                    let curr = col[i];
                    if prev.is_nan() || curr.is_nan() {
                        f64::NAN
                    } else {
                        curr / prev - 1.0
                    }
                })
                .collect()
        })
    }

    /// Last row of each observed month, labelled with that month's
    /// calendar month-end date.
    pub fn month_end(&self) -> Frame {
        let mut last_rows: Vec<usize> = Vec::new();
        for i in 0..self.len() {
            let is_last = i + 1 == self.len()
                || month_key(self.index[i]) != month_key(self.index[i + 1]);
            if is_last {
                last_rows.push(i);
            }
        }
        let mut frame = self.take_rows(&last_rows);
        frame.index = frame.index.iter().map(|&d| month_end(d)).collect();
        frame
    }

    /// As-of alignment onto `index`: each target date takes the latest row
    /// dated on or before it (after forward-filling this frame's own gaps).
    /// Target dates before the first row are `NaN`.
    pub fn as_of(&self, index: &[NaiveDate]) -> Result<Frame, FrameError> {
        check_index(index)?;
        let union: Vec<NaiveDate> = self
            .index
            .iter()
            .chain(index.iter())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        self.reindex(&union)?.forward_fill().reindex(index)
    }

    /// Append a column. Fails on a duplicate name or length mismatch.
    pub fn with_column(
        &self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Frame, FrameError> {
        let mut columns = self.columns.clone();
        let mut data = self.data.clone();
        columns.push(name.into());
        data.push(values);
        Frame::new(self.index.clone(), columns, data)
    }

    /// Outer join on date: the result index is the union of all indices and
    /// columns are concatenated in argument order.
    pub fn outer_join(frames: &[Frame]) -> Result<Frame, FrameError> {
        let union: Vec<NaiveDate> = frames
            .iter()
            .flat_map(|f| f.index.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut columns = Vec::new();
        let mut data = Vec::new();
        for frame in frames {
            let aligned = frame.reindex(&union)?;
            columns.extend(aligned.columns);
            data.extend(aligned.data);
        }
        Frame::new(union, columns, data)
    }
}
