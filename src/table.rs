use ndarray::{concatenate, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{RegressionError, Result};
use crate::parallel::Parallelism;
use crate::{Matrix, Vector};

/// Direction of a [`Table::apply`] reduction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Margin {
    Rows,
    Columns,
}

impl Margin {
    fn axis(self) -> Axis {
        match self {
            Margin::Rows => Axis(0),
            Margin::Columns => Axis(1),
        }
    }
}

/// Dense, mutable 2-D table of `f64` with optional column labels.
///
/// Row and column counts are always read from the underlying matrix, so a
/// structural change can never leave a stale dimension behind. When labels are
/// present there is exactly one unique label per column.
///
/// Trainers take a `Table` by value and may rewrite it (intercept column,
/// standardization). Clone it first if the original values are still needed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableParts", into = "TableParts")]
pub struct Table {
    data: Matrix,
    labels: Option<Vec<String>>,
}

/// Flat representation of a [`Table`]: dimensions, row-major values, labels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableParts {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<f64>,
    pub labels: Option<Vec<String>>,
}

impl Table {
    /// Builds a table from equally long rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(RegressionError::dimension("a table needs at least one row"));
        };
        let cols = first.len();

        if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != cols) {
            return Err(RegressionError::dimension(format!(
                "row {} has {} values, expected {}",
                i,
                row.len(),
                cols
            )));
        }

        let values: Vec<f64> = rows.iter().flatten().copied().collect();
        let data = Matrix::from_shape_vec((rows.len(), cols), values)
            .map_err(|e| RegressionError::dimension(e.to_string()))?;

        Ok(Self { data, labels: None })
    }

    pub fn from_matrix(data: Matrix) -> Self {
        Self { data, labels: None }
    }

    /// Attaches column labels. Blank labels become `$<index>`.
    pub fn with_labels(mut self, labels: Vec<String>) -> Result<Self> {
        if labels.len() != self.cols() {
            return Err(RegressionError::dimension(format!(
                "{} labels given for {} columns",
                labels.len(),
                self.cols()
            )));
        }

        let labels: Vec<String> = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| {
                if label.trim().is_empty() {
                    format!("${}", i)
                } else {
                    label
                }
            })
            .collect();

        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(RegressionError::Label(format!("duplicate column label `{}`", label)));
            }
        }

        self.labels = Some(labels);
        Ok(self)
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn dims(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn data(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    /// Row-major copy of every value.
    pub fn values(&self) -> Vec<f64> {
        self.data.iter().copied().collect()
    }

    pub fn into_matrix(self) -> Matrix {
        self.data
    }

    pub fn get_row(&self, i: usize) -> Result<ArrayView1<'_, f64>> {
        self.check_row(i)?;
        Ok(self.data.row(i))
    }

    pub fn get_col(&self, j: usize) -> Result<ArrayView1<'_, f64>> {
        self.check_col(j)?;
        Ok(self.data.column(j))
    }

    pub fn col_index(&self, label: &str) -> Result<usize> {
        self.labels
            .as_ref()
            .and_then(|labels| labels.iter().position(|l| l == label))
            .ok_or_else(|| RegressionError::Label(format!("unknown column `{}`", label)))
    }

    pub fn get_col_by_label(&self, label: &str) -> Result<ArrayView1<'_, f64>> {
        let j = self.col_index(label)?;
        Ok(self.data.column(j))
    }

    pub fn append_row(&mut self, row: &[f64]) -> Result<()> {
        self.check_row_len(row)?;
        let row = ArrayView1::from(row).insert_axis(Axis(0));
        self.data = concatenate(Axis(0), &[self.data.view(), row])
            .map_err(|e| RegressionError::dimension(e.to_string()))?;
        Ok(())
    }

    pub fn push_row(&mut self, row: &[f64]) -> Result<()> {
        self.check_row_len(row)?;
        let row = ArrayView1::from(row).insert_axis(Axis(0));
        self.data = concatenate(Axis(0), &[row, self.data.view()])
            .map_err(|e| RegressionError::dimension(e.to_string()))?;
        Ok(())
    }

    /// Appends a column. A labelled table gets a generated `$<index>` label.
    pub fn append_col(&mut self, col: &[f64]) -> Result<()> {
        let label = self.labels.as_ref().map(|labels| fresh_label(labels, self.cols()));
        self.insert_col(self.cols(), col, label)
    }

    pub fn append_col_labeled(&mut self, label: &str, col: &[f64]) -> Result<()> {
        self.insert_col(self.cols(), col, Some(label.to_string()))
    }

    /// Inserts a column at index 0, shifting the others right.
    pub fn push_col(&mut self, col: &[f64]) -> Result<()> {
        let label = self.labels.as_ref().map(|labels| fresh_label(labels, 0));
        self.insert_col(0, col, label)
    }

    pub fn push_col_labeled(&mut self, label: &str, col: &[f64]) -> Result<()> {
        self.insert_col(0, col, Some(label.to_string()))
    }

    pub fn remove_row(&mut self, i: usize) -> Result<()> {
        self.check_row(i)?;
        let keep: Vec<usize> = (0..self.rows()).filter(|&r| r != i).collect();
        self.data = self.data.select(Axis(0), &keep);
        Ok(())
    }

    pub fn remove_col(&mut self, j: usize) -> Result<()> {
        self.check_col(j)?;
        let keep: Vec<usize> = (0..self.cols()).filter(|&c| c != j).collect();
        self.data = self.data.select(Axis(1), &keep);
        if let Some(labels) = self.labels.as_mut() {
            labels.remove(j);
        }
        Ok(())
    }

    /// New table holding the listed columns, in the listed order.
    pub fn select_cols(&self, cols: &[usize]) -> Result<Table> {
        for (k, &j) in cols.iter().enumerate() {
            self.check_col(j)?;
            if cols[..k].contains(&j) {
                return Err(RegressionError::dimension(format!(
                    "column {} selected twice",
                    j
                )));
            }
        }

        Ok(Table {
            data: self.data.select(Axis(1), cols),
            labels: self
                .labels
                .as_ref()
                .map(|labels| cols.iter().map(|&j| labels[j].clone()).collect()),
        })
    }

    /// Applies `f` element-wise to the listed columns; no columns means all.
    ///
    /// Indices are validated before anything is written.
    pub fn transform<F>(&mut self, f: F, cols: &[usize]) -> Result<()>
    where
        F: Fn(f64) -> f64,
    {
        let mut cols = self.resolve_indices(Margin::Columns, cols)?;
        cols.sort_unstable();
        cols.dedup();

        for j in cols {
            self.data.column_mut(j).mapv_inplace(&f);
        }
        Ok(())
    }

    /// Reduces each listed row or column to a scalar; no indices means all.
    ///
    /// Output slot `k` always holds the reduction of `indices[k]`.
    pub fn apply<F>(
        &self,
        f: F,
        margin: Margin,
        indices: &[usize],
        parallelism: Parallelism,
    ) -> Result<Vector>
    where
        F: Fn(ArrayView1<'_, f64>) -> f64 + Sync + Send,
    {
        let indices = self.resolve_indices(margin, indices)?;
        let axis = margin.axis();
        let data = &self.data;

        let out = parallelism.map_indexed(indices.len(), |k| f(data.index_axis(axis, indices[k])));
        Ok(Vector::from(out))
    }

    /// Rescales every column in place to `(x - mean) / sd`.
    ///
    /// Uses the sample standard deviation. A constant column is only centered.
    pub fn standardize(&mut self) {
        for (j, (mean, sd)) in self.column_moments().into_iter().enumerate() {
            let mut col = self.data.column_mut(j);
            if sd > 0.0 && sd.is_finite() {
                col.mapv_inplace(|x| (x - mean) / sd);
            } else {
                col.mapv_inplace(|x| x - mean);
            }
        }
    }

    /// Rescales every column in place to `x / sum(x)`. Zero-sum columns are
    /// left unchanged.
    pub fn normalize(&mut self) {
        for mut col in self.data.columns_mut() {
            let total = col.sum();
            if total != 0.0 {
                col.mapv_inplace(|x| x / total);
            }
        }
    }

    /// `(mean, sample sd)` of every column.
    pub(crate) fn column_moments(&self) -> Vec<(f64, f64)> {
        let n = self.rows();
        self.data
            .columns()
            .into_iter()
            .map(|col| {
                if n == 0 {
                    return (0.0, 0.0);
                }
                let mean = col.sum() / n as f64;
                if n < 2 {
                    return (mean, 0.0);
                }
                let ss: f64 = col.iter().map(|x| (x - mean) * (x - mean)).sum();
                (mean, (ss / (n - 1) as f64).sqrt())
            })
            .collect()
    }

    fn insert_col(&mut self, at: usize, col: &[f64], label: Option<String>) -> Result<()> {
        if col.len() != self.rows() {
            return Err(RegressionError::dimension(format!(
                "column has {} values, table has {} rows",
                col.len(),
                self.rows()
            )));
        }

        let labels = match label {
            Some(label) => {
                let mut labels = self.labels.clone().unwrap_or_else(|| {
                    (0..self.cols()).map(|j| format!("${}", j)).collect()
                });
                if labels.contains(&label) {
                    return Err(RegressionError::Label(format!(
                        "duplicate column label `{}`",
                        label
                    )));
                }
                labels.insert(at, label);
                Some(labels)
            }
            None => None,
        };

        let col = ArrayView1::from(col).insert_axis(Axis(1));
        let (left, right) = self.data.view().split_at(Axis(1), at);
        self.data = concatenate(Axis(1), &[left, col, right])
            .map_err(|e| RegressionError::dimension(e.to_string()))?;
        self.labels = labels;
        Ok(())
    }

    fn resolve_indices(&self, margin: Margin, indices: &[usize]) -> Result<Vec<usize>> {
        let bound = match margin {
            Margin::Rows => self.rows(),
            Margin::Columns => self.cols(),
        };
        if indices.is_empty() {
            return Ok((0..bound).collect());
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= bound) {
            return Err(RegressionError::dimension(format!(
                "{:?} index {} out of range for {} entries",
                margin, bad, bound
            )));
        }
        Ok(indices.to_vec())
    }

    fn check_row(&self, i: usize) -> Result<()> {
        if i >= self.rows() {
            return Err(RegressionError::dimension(format!(
                "row {} out of range for {} rows",
                i,
                self.rows()
            )));
        }
        Ok(())
    }

    fn check_col(&self, j: usize) -> Result<()> {
        if j >= self.cols() {
            return Err(RegressionError::dimension(format!(
                "column {} out of range for {} columns",
                j,
                self.cols()
            )));
        }
        Ok(())
    }

    fn check_row_len(&self, row: &[f64]) -> Result<()> {
        if row.len() != self.cols() {
            return Err(RegressionError::dimension(format!(
                "row has {} values, table has {} columns",
                row.len(),
                self.cols()
            )));
        }
        Ok(())
    }
}

fn fresh_label(labels: &[String], position: usize) -> String {
    let base = format!("${}", position);
    if !labels.contains(&base) {
        return base;
    }
    (1..)
        .map(|k| format!("{}.{}", base, k))
        .find(|candidate| !labels.contains(candidate))
        .unwrap_or(base)
}

impl TryFrom<TableParts> for Table {
    type Error = RegressionError;

    fn try_from(parts: TableParts) -> Result<Self> {
        let data = Matrix::from_shape_vec((parts.rows, parts.cols), parts.values)
            .map_err(|e| RegressionError::dimension(e.to_string()))?;
        let table = Table::from_matrix(data);
        match parts.labels {
            Some(labels) => table.with_labels(labels),
            None => Ok(table),
        }
    }
}

impl From<Table> for TableParts {
    fn from(table: Table) -> Self {
        TableParts {
            rows: table.rows(),
            cols: table.cols(),
            values: table.values(),
            labels: table.labels,
        }
    }
}
