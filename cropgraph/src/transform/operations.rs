//! Column operations.
//!
//! An [`OperationSpec`] turns one or more input series into exactly one
//! derived series, then optionally scales it.
//!
//! | Operation | Result per row `i` |
//! |-----------|--------------------|
//! | `sum` | `in[0][i] + in[1][i] + ...` |
//! | `diff` | `in[0][i] - in[1][i] - ...` |
//! | `avg` | `sum[i] / number of inputs` |
//! | `dailydifference` | `0` for the first row, then `in[0][i] - in[0][i-1]` |
//! | `none` | `in[0][i]` unchanged |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GraphError, GraphResult};
use crate::models::Series;

/// Operation kinds, spelled exactly as in config files.
///
/// Unknown spellings are kept as [`OperationKind::Other`] so that a bad
/// config only fails the graph using it, at apply time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationKind {
    Sum,
    Diff,
    Avg,
    DailyDifference,
    None,
    Other(String),
}

impl OperationKind {
    pub fn as_str(&self) -> &str {
        match self {
            OperationKind::Sum => "sum",
            OperationKind::Diff => "diff",
            OperationKind::Avg => "avg",
            OperationKind::DailyDifference => "dailydifference",
            OperationKind::None => "none",
            OperationKind::Other(name) => name,
        }
    }
}

impl From<String> for OperationKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "sum" => OperationKind::Sum,
            "diff" => OperationKind::Diff,
            "avg" => OperationKind::Avg,
            "dailydifference" => OperationKind::DailyDifference,
            "none" => OperationKind::None,
            _ => OperationKind::Other(value),
        }
    }
}

impl From<&str> for OperationKind {
    fn from(value: &str) -> Self {
        OperationKind::from(value.to_string())
    }
}

impl From<OperationKind> for String {
    fn from(kind: OperationKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A derived column of a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSpec {
    /// Name of the output series
    pub name: String,

    #[serde(rename = "operation")]
    pub kind: OperationKind,

    /// Input columns; order matters for `diff`
    #[serde(default)]
    pub columns: Vec<String>,

    /// Scale factor; 0 and 1 both mean "unscaled"
    #[serde(default)]
    pub multiply: f64,
}

impl OperationSpec {
    pub fn new(name: impl Into<String>, kind: impl Into<OperationKind>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            multiply: 0.0,
        }
    }

    pub fn with_multiply(mut self, factor: f64) -> Self {
        self.multiply = factor;
        self
    }
}

/// Apply an operation to its already-resolved inputs.
///
/// Inputs must all have the same length. The returned series is always new;
/// inputs are never modified.
pub fn apply_operation(spec: &OperationSpec, inputs: &[&Series]) -> GraphResult<Series> {
    if let OperationKind::Other(name) = &spec.kind {
        return Err(GraphError::UnsupportedOperation(name.clone()));
    }

    let (first, rest) = inputs
        .split_first()
        .ok_or_else(|| GraphError::EmptyOperationInput(spec.kind.to_string()))?;

    for (k, series) in rest.iter().enumerate() {
        if series.len() != first.len() {
            return Err(GraphError::MismatchedLengths {
                column: spec.columns.get(k + 1).cloned().unwrap_or_else(|| format!("#{}", k + 1)),
                expected: first.len(),
                got: series.len(),
            });
        }
    }

    let output = match &spec.kind {
        OperationKind::Sum => Series::from_numbers(fold_rows(first, rest, |acc, v| acc + v)?),
        OperationKind::Diff => Series::from_numbers(fold_rows(first, rest, |acc, v| acc - v)?),
        OperationKind::Avg => {
            let count = inputs.len() as f64;
            let sums = fold_rows(first, rest, |acc, v| acc + v)?;
            Series::from_numbers(sums.into_iter().map(|s| s / count))
        }
        OperationKind::DailyDifference => daily_difference(first)?,
        OperationKind::None => (*first).clone(),
        OperationKind::Other(name) => return Err(GraphError::UnsupportedOperation(name.clone())),
    };

    multiply(output, spec.multiply)
}

/// Start each row from the first input and fold the others into it.
fn fold_rows(first: &Series, rest: &[&Series], op: impl Fn(f64, f64) -> f64) -> GraphResult<Vec<f64>> {
    let mut rows = first.to_numbers()?;
    for series in rest {
        for (acc, cell) in rows.iter_mut().zip(series.iter()) {
            *acc = op(*acc, cell.to_number()?);
        }
    }
    Ok(rows)
}

fn daily_difference(input: &Series) -> GraphResult<Series> {
    let values = input.to_numbers()?;
    let mut out = Vec::with_capacity(values.len());
    if !values.is_empty() {
        out.push(0.0);
    }
    out.extend(values.windows(2).map(|w| w[1] - w[0]));
    Ok(Series::from_numbers(out))
}

/// Scale every element by `factor`.
///
/// A factor of 0 is treated like "not configured" and, like 1, leaves the
/// series as it is (cells are not even coerced).
pub fn multiply(series: Series, factor: f64) -> GraphResult<Series> {
    if factor == 0.0 || factor == 1.0 {
        return Ok(series);
    }
    let values = series.to_numbers()?;
    Ok(Series::from_numbers(values.into_iter().map(|v| v * factor)))
}

/// Get a description of all available operations for the CLI
pub fn operations_description() -> String {
    r#"Available column operations (columnview entries):

| Operation       | Description                                   | Inputs |
|-----------------|-----------------------------------------------|--------|
| sum             | Row-wise sum of all input columns             | 1..n   |
| diff            | First column minus all following columns      | 1..n   |
| avg             | Row-wise mean of all input columns            | 1..n   |
| dailydifference | Change from the previous row (first row is 0) | 1      |
| none            | First column unchanged                        | 1      |

Every entry may set `multiply`: the result is scaled by that factor,
except for 0 and 1, which both leave it unscaled.

The axis is labelled with the graph's `datecolumn` when it is listed in
`columns`, with or without a columnview; otherwise rows are numbered from 0.

Example:
columnview:
  - name: Total water
    operation: sum
    columns: [Wat1, Wat2, Wat3]
    multiply: 0
  - name: Daily growth
    operation: dailydifference
    columns: [Biomass]
    multiply: 0.001"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn nums(values: &[f64]) -> Series {
        Series::from_numbers(values.iter().copied())
    }

    fn run(kind: &str, inputs: &[Series]) -> GraphResult<Series> {
        let names: Vec<String> = (0..inputs.len()).map(|i| format!("c{i}")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let spec = OperationSpec::new("out", kind, &names);
        let refs: Vec<&Series> = inputs.iter().collect();
        apply_operation(&spec, &refs)
    }

    #[test]
    fn test_sum() {
        let out = run("sum", &[nums(&[1.0, 2.0, 3.0]), nums(&[10.0, 20.0, 30.0])]).unwrap();
        assert_eq!(out, nums(&[11.0, 22.0, 33.0]));
    }

    #[test]
    fn test_diff_is_left_to_right() {
        let out = run("diff", &[nums(&[5.0]), nums(&[2.0]), nums(&[1.0])]).unwrap();
        assert_eq!(out, nums(&[2.0]));
    }

    #[test]
    fn test_avg() {
        let out = run("avg", &[nums(&[2.0, 4.0]), nums(&[4.0, 8.0])]).unwrap();
        assert_eq!(out, nums(&[3.0, 6.0]));
    }

    #[test]
    fn test_daily_difference() {
        let out = run("dailydifference", &[nums(&[10.0, 15.0, 13.0])]).unwrap();
        assert_eq!(out, nums(&[0.0, 5.0, -2.0]));

        let empty = run("dailydifference", &[Series::default()]).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_text_cells_are_coerced() {
        let a = Series::new(vec!["1.5".into(), "2".into()]);
        let b = Series::new(vec![Cell::Number(0.5), "3".into()]);
        let out = run("sum", &[a, b]).unwrap();
        assert_eq!(out, nums(&[2.0, 5.0]));
    }

    #[test]
    fn test_multiply() {
        assert_eq!(multiply(nums(&[1.0, 2.0, 3.0]), 2.0).unwrap(), nums(&[2.0, 4.0, 6.0]));
        // 0 and 1 both leave the series untouched
        assert_eq!(multiply(nums(&[1.0, 2.0, 3.0]), 0.0).unwrap(), nums(&[1.0, 2.0, 3.0]));
        assert_eq!(multiply(nums(&[1.0, 2.0, 3.0]), 1.0).unwrap(), nums(&[1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_multiply_applies_after_operation() {
        let spec = OperationSpec::new("out", "sum", &["a", "b"]).with_multiply(-1.0);
        let (a, b) = (nums(&[1.0, 2.0]), nums(&[3.0, 4.0]));
        let out = apply_operation(&spec, &[&a, &b]).unwrap();
        assert_eq!(out, nums(&[-4.0, -6.0]));
    }

    #[test]
    fn test_none_with_unit_factor_is_identity() {
        let input = Series::new(vec!["01.01.2020".into(), Cell::Number(2.0)]);
        let spec = OperationSpec::new("out", "none", &["a"]).with_multiply(1.0);
        let out = apply_operation(&spec, &[&input]).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_unsupported_operation() {
        let err = run("median", &[nums(&[1.0])]).unwrap_err();
        assert_eq!(err, GraphError::UnsupportedOperation("median".into()));
    }

    #[test]
    fn test_empty_input() {
        for kind in ["sum", "diff", "avg", "dailydifference", "none"] {
            let err = run(kind, &[]).unwrap_err();
            assert_eq!(err, GraphError::EmptyOperationInput(kind.into()));
        }
    }

    #[test]
    fn test_mismatched_lengths() {
        let err = run("sum", &[nums(&[1.0, 2.0]), nums(&[1.0])]).unwrap_err();
        assert_eq!(
            err,
            GraphError::MismatchedLengths {
                column: "c1".into(),
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn test_non_numeric_cell() {
        let bad = Series::new(vec!["1".into(), "x".into()]);
        let err = run("sum", &[bad, nums(&[1.0, 1.0])]).unwrap_err();
        assert_eq!(err, GraphError::NonNumericValue("x".into()));
    }

    #[test]
    fn test_description_lists_every_operation() {
        let text = operations_description();
        for kind in ["sum", "diff", "avg", "dailydifference", "none"] {
            assert!(text.contains(kind), "missing {kind}");
        }
        assert!(text.contains("datecolumn"));
    }

    #[test]
    fn test_kind_wire_format() {
        let spec: OperationSpec = serde_json::from_str(
            r#"{"name":"d","operation":"dailydifference","columns":["a"],"multiply":2.5}"#,
        )
        .unwrap();
        assert_eq!(spec.kind, OperationKind::DailyDifference);

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["operation"], "dailydifference");

        let other: OperationKind = "Sum".into();
        assert_eq!(other, OperationKind::Other("Sum".into()));
    }
}
