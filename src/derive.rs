//! Derived numeric columns from simple arithmetic on existing ones.

use std::{fmt, str::FromStr};

use crate::{
    assemble::derived_column_name,
    error::{Error, Result},
    table::FeatureTable,
};

/// Most decimal places a derived column can be rounded to.
pub const MAX_DIGITS: u32 = 15;

/// Why a single cell could not be computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComputeError {
    /// An operand cell is empty.
    MissingValue,
    /// Logarithm or square root outside its domain.
    Domain,
    DivisionByZero,
    /// The result overflowed or is otherwise not a number.
    NonFinite,
}

impl fmt::Display for ComputeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComputeError::MissingValue => "missing value",
            ComputeError::Domain => "outside the domain of the operation",
            ComputeError::DivisionByZero => "division by zero",
            ComputeError::NonFinite => "not a finite number",
        })
    }
}

/// Outcome of one cell.
pub type Cell = std::result::Result<f64, ComputeError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Log,
    Sqrt,
    Abs,
    Square,
    Negate,
}

impl UnaryOp {
    pub fn apply(self, x: f64) -> Cell {
        let y = match self {
            UnaryOp::Log if x <= 0.0 => return Err(ComputeError::Domain),
            UnaryOp::Log => x.ln(),
            UnaryOp::Sqrt if x < 0.0 => return Err(ComputeError::Domain),
            UnaryOp::Sqrt => x.sqrt(),
            UnaryOp::Abs => x.abs(),
            UnaryOp::Square => x * x,
            UnaryOp::Negate => -x,
        };
        finite(y)
    }
}

impl FromStr for UnaryOp {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" | "ln" => Ok(UnaryOp::Log),
            "sqrt" => Ok(UnaryOp::Sqrt),
            "abs" => Ok(UnaryOp::Abs),
            "square" => Ok(UnaryOp::Square),
            "negate" | "neg" => Ok(UnaryOp::Negate),
            other => Err(format!("unknown operation {other:?} (expected log, sqrt, abs, square or negate)")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    pub fn apply(self, a: f64, b: f64) -> Cell {
        let y = match self {
            BinaryOp::Add => a + b,
            BinaryOp::Subtract => a - b,
            BinaryOp::Multiply => a * b,
            BinaryOp::Divide if b == 0.0 => return Err(ComputeError::DivisionByZero),
            BinaryOp::Divide => a / b,
        };
        finite(y)
    }
}

impl FromStr for BinaryOp {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "+" | "add" => Ok(BinaryOp::Add),
            "-" | "sub" => Ok(BinaryOp::Subtract),
            "*" | "x" | "mul" => Ok(BinaryOp::Multiply),
            "/" | "div" => Ok(BinaryOp::Divide),
            other => Err(format!("unknown operator {other:?} (expected +, -, * or /)")),
        }
    }
}

fn finite(y: f64) -> Cell {
    if y.is_finite() { Ok(y) } else { Err(ComputeError::NonFinite) }
}

/// A column, optionally transformed before use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operand {
    pub column: String,
    pub transform: Option<UnaryOp>,
}

impl Operand {
    pub fn column(column: impl Into<String>) -> Self {
        Self { column: column.into(), transform: None }
    }

    pub fn with(mut self, transform: UnaryOp) -> Self {
        self.transform = Some(transform);
        self
    }

    fn evaluate(&self, table: &FeatureTable) -> Result<Vec<Cell>> {
        Ok(numeric_operand(table, &self.column)?.into_iter()
            .map(|value| {
                let value = value.ok_or(ComputeError::MissingValue)?;
                match self.transform {
                    Some(op) => op.apply(value),
                    None => Ok(value),
                }
            })
            .collect())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expression {
    Unary { op: UnaryOp, column: String },
    Binary { left: Operand, op: BinaryOp, right: Operand },
}

impl Expression {
    /// Every cell of the expression over `table`, in row order.
    pub fn evaluate(&self, table: &FeatureTable) -> Result<Vec<Cell>> {
        match self {
            Expression::Unary { op, column } => Operand::column(column.clone()).with(*op).evaluate(table),
            Expression::Binary { left, op, right } => {
                let left = left.evaluate(table)?;
                let right = right.evaluate(table)?;
                Ok(left.into_iter().zip(right).map(|(a, b)| op.apply(a?, b?)).collect())
            }
        }
    }
}

fn numeric_operand(table: &FeatureTable, name: &str) -> Result<Vec<Option<f64>>> {
    let column = table.column(name).ok_or_else(|| Error::MissingColumn(name.to_string()))?;
    if !column.is_numeric() {
        return Err(Error::InvalidSpecification(format!("column {name:?} is not numeric")));
    }
    table.numeric_values(name)
}

/// Round half to even at `digits` decimal places.
pub fn round_to(value: f64, digits: u32) -> f64 {
    let scale = 10f64.powi(digits as i32);
    let rounded = (value * scale).round_ties_even() / scale;
    if rounded.is_finite() { rounded } else { value }
}

/// Cells that could not be computed, by reason.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeriveReport {
    /// Name of the new column.
    pub column: String,
    pub computed: usize,
    pub failures: Vec<(u32, ComputeError)>,
}

/// Add the result of `expr` to a copy of `table` as a numeric column named
/// after `name`, rounded to `digits` places. Cells that cannot be computed
/// are left empty and listed in the report by original row id.
pub fn apply(table: &FeatureTable, expr: &Expression, name: &str, digits: u32) -> Result<(FeatureTable, DeriveReport)> {
    if name.trim().is_empty() {
        return Err(Error::InvalidSpecification("the new variable needs a name".into()));
    }
    if digits > MAX_DIGITS {
        return Err(Error::InvalidSpecification(format!("cannot round to {digits} places (at most {MAX_DIGITS})")));
    }

    let cells = expr.evaluate(table)?;
    let row_ids = table.row_ids()?;
    let column = derived_column_name(name);

    let mut report = DeriveReport { column: column.clone(), ..DeriveReport::default() };
    let values = cells.into_iter().zip(row_ids)
        .map(|(cell, row)| match cell {
            Ok(v) => {
                report.computed += 1;
                Some(round_to(v, digits))
            }
            Err(reason) => {
                report.failures.push((row, reason));
                None
            }
        })
        .collect();

    let mut out = table.clone();
    out.set_numeric_column(&column, values)?;
    Ok((out, report))
}
