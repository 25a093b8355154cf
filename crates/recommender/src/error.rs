//! Error types for the recommender crate.

use thiserror::Error;

/// Errors raised while building or querying a factorization model
#[derive(Error, Debug)]
pub enum EngineError {
    /// External identifier is not in the relevant identity map
    #[error("Unknown {kind} identifier: {id}")]
    UnknownIdentity { kind: IdentityKind, id: String },

    /// Query issued before `train`
    #[error("Model has not been trained")]
    NotTrained,

    /// `train` called on an engine that already holds a model
    #[error("Model is already trained; reset the engine before retraining")]
    AlreadyTrained,

    /// Matrix and identity maps disagree about dimensions
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Preprocessing was handed no interactions
    #[error("Cannot preprocess an empty interaction set")]
    EmptyInput,

    /// Hyperparameter outside its legal range
    #[error("Invalid hyperparameter {name}: {value}")]
    InvalidHyperparameters { name: &'static str, value: String },

    /// The factorization solver failed
    #[error("Factorization failed: {0}")]
    Factorization(String),
}

/// Which side of the interaction matrix an identifier belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    User,
    Item,
}

impl std::fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityKind::User => write!(f, "user"),
            IdentityKind::Item => write!(f, "item"),
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, EngineError>;
