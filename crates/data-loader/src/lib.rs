//! # Data Loader Crate
//!
//! This crate handles interaction logs: the (user, item, weight) records
//! that feed the recommender.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Interaction, ColumnSpec, DatasetStats)
//! - **parser**: Read and write comma-separated interaction files
//! - **aggregate**: Collapse repeated (user, item) pairs
//! - **split**: Seeded train/held-out partition
//! - **synth**: Power-law synthetic log generator
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{parse_interactions, aggregate_duplicates, train_test_split, ColumnSpec};
//! use std::path::Path;
//!
//! let log = parse_interactions(Path::new("implicit_feedback_data.csv"), &ColumnSpec::default())?;
//! let log = aggregate_duplicates(log);
//! let (train, held_out) = train_test_split(log, 0.2, 42)?;
//! ```

// Public modules
pub mod aggregate;
pub mod error;
pub mod parser;
pub mod split;
pub mod synth;
pub mod types;

// Re-export commonly used types for convenience
pub use aggregate::aggregate_duplicates;
pub use error::{DataLoadError, Result};
pub use parser::{parse_interactions, write_interactions};
pub use split::train_test_split;
pub use synth::{SyntheticConfig, generate_synthetic};
pub use types::{ColumnSpec, DatasetStats, Interaction, ItemId, UserId};
