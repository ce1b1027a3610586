use polars::prelude::DataType;

/// Semantic type of a column, fixed once at ingestion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
    Geometry,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub kind: ColumnKind,
    pub nullable: bool,
}

impl ColumnSchema {
    pub(crate) fn infer(name: &str, dtype: &DataType, null_count: usize) -> Self {
        let kind = if dtype.is_integer() || dtype.is_float() { ColumnKind::Numeric } else { ColumnKind::Text };
        Self { name: name.to_string(), kind, nullable: null_count > 0 }
    }

    #[inline] pub fn is_numeric(&self) -> bool { self.kind == ColumnKind::Numeric }
}
