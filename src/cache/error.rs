use thiserror::Error;

/// Errors returned by cache session operations.
///
/// All of these are caller mistakes, either malformed input (an empty family
/// name, label arrays of unequal length) or misuse of the staleness policy
/// (explicit deletion on a reset-mode cache). The cache state is left
/// untouched by a failed call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("empty metric family name")]
    EmptyFamilyName,

    #[error("label name/value length mismatch: {names} names, {values} values")]
    LabelMismatch { names: usize, values: usize },

    #[error("explicit deletion requires a watch-mode cache")]
    DeleteInResetMode,
}

pub type Result<T> = std::result::Result<T, CacheError>;
