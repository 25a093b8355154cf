//! # Recommender Crate
//!
//! Latent factor recommendations from implicit feedback.
//!
//! ## Components
//!
//! ### Preprocessing
//! - **identity**: external ID <-> dense index maps
//! - **scaler**: min-max normalization of raw weights
//! - **matrix**: sparse user x item matrix and its builder
//! - **preprocess**: the immutable `Catalog` (maps, scaler, popular items)
//!
//! ### Model
//! - **factorizer**: the pluggable `Factorizer` trait and `LatentFactors`
//! - **als**: built-in implicit alternating least squares solver
//! - **engine**: `FactorizationEngine` (train, recommend, similar items,
//!   cold start)
//! - **explain**: similarity-based explanations
//!
//! ## Example Usage
//!
//! ```ignore
//! use recommender::{FactorizationEngine, Hyperparameters, Preprocessed, Preprocessor};
//! use std::sync::Arc;
//!
//! let Preprocessed { matrix, catalog } = Preprocessor::new().preprocess(&train)?;
//! let mut engine = FactorizationEngine::new(Arc::new(catalog), Hyperparameters::default());
//! engine.train(matrix)?;
//!
//! let recommendations = engine.recommend("3f2a9c1e", 10)?;
//! let explanation = engine.explain("3f2a9c1e", &recommendations[0].item_id)?;
//! ```

pub mod als;
pub mod config;
pub mod engine;
pub mod error;
pub mod explain;
pub mod factorizer;
pub mod identity;
pub mod matrix;
pub mod preprocess;
pub mod scaler;
pub mod traits;
pub mod types;

// Re-export main types
pub use als::AlsFactorizer;
pub use config::Hyperparameters;
pub use engine::{COLD_START_SCORE, FactorizationEngine};
pub use error::{EngineError, IdentityKind, Result};
pub use explain::{EXPLANATION_NEIGHBORS, Explanation};
pub use factorizer::{Factorizer, LatentFactors};
pub use identity::IdentityMap;
pub use matrix::{InteractionMatrix, InteractionMatrixBuilder, MatrixRow};
pub use preprocess::{Catalog, DEFAULT_POPULAR_ITEMS, Preprocessed, Preprocessor};
pub use scaler::MinMaxScaler;
pub use traits::Recommend;
pub use types::{Recommendation, SimilarItem};
