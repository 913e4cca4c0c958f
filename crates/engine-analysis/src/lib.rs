//! Depth-fixed engine analysis of a position sequence over UCI.

pub mod board;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod pipeline;
pub mod report;
pub mod translate;
pub mod waiter;

pub use config::{EngineConfig, FinalPositionPolicy};
pub use engine::UciEngine;
pub use error::{AnalysisError, EngineError, ExtractError, PositionError, SearchError, TranslateError};
pub use eval::{EvaluationScore, ScoreKind};
pub use pipeline::{analyze, AnalysisPipeline, AnalysisRecord, PositionFailure, PositionResult};
pub use report::{Reporter, TracingReporter};
