use std::fmt;

use polars::error::PolarsError;

/// Pipeline stage an error originated in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Source,
    Table,
    Geometry,
    Variables,
    Gwr,
    Autocorrelation,
    Assemble,
    Render,
    Derive,
    Publish,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Source => "source",
            Stage::Table => "table",
            Stage::Geometry => "geometry",
            Stage::Variables => "variables",
            Stage::Gwr => "gwr",
            Stage::Autocorrelation => "moran",
            Stage::Assemble => "assemble",
            Stage::Render => "render",
            Stage::Derive => "derive",
            Stage::Publish => "publish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// How a failure affects the rest of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Halts the run; nothing is shown.
    Input,
    /// The user may change the variable selection and retry.
    Model,
    /// Regression results stand; only the Moran's I section is skipped.
    Autocorrelation,
    /// The assembled table is kept so the upload can be retried.
    Publish,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("[source] {0}")]
    Source(String),

    #[error("[table] column name {0:?} appears more than once after trimming whitespace")]
    DuplicateColumn(String),

    #[error("[table] column {0:?} not found")]
    MissingColumn(String),

    #[error("[geometry] no geometry column and no latitude/longitude columns found")]
    GeometryNotFound,

    #[error("[geometry] row {row}: cannot parse {column:?} as WKT: {reason}")]
    GeometryParseError { row: u32, column: String, reason: String },

    #[error("[variables] {0}")]
    InvalidSpecification(String),

    #[error("[gwr] {available} complete rows remain, at least {required} are needed")]
    InsufficientData { required: usize, available: usize },

    #[error("[gwr] bandwidth search failed: {0}")]
    BandwidthSearchFailed(String),

    #[error("[gwr] local regression for row {row} is singular")]
    SingularSystem { row: u32 },

    #[error("[moran] {0}")]
    AutocorrelationFailed(String),

    #[error("[publish] {0}")]
    PublishFailed(String),

    #[error("[{stage}] {source}")]
    Data { stage: Stage, #[source] source: PolarsError },
}

impl Error {
    /// Attach a stage to a polars failure.
    pub(crate) fn data(stage: Stage) -> impl FnOnce(PolarsError) -> Self {
        move |source| Error::Data { stage, source }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Error::Source(_) => Stage::Source,
            Error::DuplicateColumn(_) | Error::MissingColumn(_) => Stage::Table,
            Error::GeometryNotFound | Error::GeometryParseError { .. } => Stage::Geometry,
            Error::InvalidSpecification(_) => Stage::Variables,
            Error::InsufficientData { .. }
            | Error::BandwidthSearchFailed(_)
            | Error::SingularSystem { .. } => Stage::Gwr,
            Error::AutocorrelationFailed(_) => Stage::Autocorrelation,
            Error::PublishFailed(_) => Stage::Publish,
            Error::Data { stage, .. } => *stage,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Error::InvalidSpecification(_)
            | Error::InsufficientData { .. }
            | Error::BandwidthSearchFailed(_)
            | Error::SingularSystem { .. } => ErrorClass::Model,
            Error::AutocorrelationFailed(_) => ErrorClass::Autocorrelation,
            Error::PublishFailed(_) => ErrorClass::Publish,
            Error::Data { stage: Stage::Autocorrelation, .. } => ErrorClass::Autocorrelation,
            Error::Data { stage: Stage::Publish, .. } => ErrorClass::Publish,
            _ => ErrorClass::Input,
        }
    }

    #[inline] pub fn is_recoverable(&self) -> bool { self.class() != ErrorClass::Input }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_stage_prefix() {
        let err = Error::InsufficientData { required: 3, available: 2 };
        assert_eq!(err.to_string(), "[gwr] 2 complete rows remain, at least 3 are needed");
        assert_eq!(err.stage(), Stage::Gwr);
    }

    #[test]
    fn classes_follow_recoverability_policy() {
        assert!(!Error::GeometryNotFound.is_recoverable());
        assert!(!Error::Source("unreachable".into()).is_recoverable());
        assert_eq!(Error::BandwidthSearchFailed("x".into()).class(), ErrorClass::Model);
        assert_eq!(Error::AutocorrelationFailed("x".into()).class(), ErrorClass::Autocorrelation);
        assert_eq!(Error::PublishFailed("x".into()).class(), ErrorClass::Publish);
        assert!(Error::PublishFailed("x".into()).is_recoverable());
    }
}
