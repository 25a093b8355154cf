//! # Evaluation Crate
//!
//! Offline ranking metrics for any [`recommender::Recommend`]
//! implementation, scored against a held-out slice of the interaction log.
//!
//! ## Example Usage
//!
//! ```ignore
//! use evaluation::Evaluator;
//!
//! let report = Evaluator::new(&engine).evaluate(&held_out, 10)?;
//! println!("precision@10 = {:.4}", report.precision_at_k);
//! ```

pub mod evaluator;

pub use evaluator::{EvaluationReport, Evaluator};
