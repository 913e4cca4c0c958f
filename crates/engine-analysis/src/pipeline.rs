//! Position-by-position analysis over a single engine
//!
//! Every position gets exactly one entry in the output. The move shown on a
//! record is the one the engine found for the *previous* position; the move
//! found for a position is carried forward as a [`PendingMove`].

use serde::{Serialize, Serializer};
use shakmaty::Chess;
use tracing::{debug, info, warn};

use crate::board;
use crate::config::{EngineConfig, FinalPositionPolicy};
use crate::engine::UciEngine;
use crate::error::{AnalysisError, PositionError, SearchError};
use crate::eval::EvaluationScore;
use crate::report::{Reporter, TracingReporter};
use crate::translate::PendingMove;
use crate::waiter::{self, Reply, WaitMode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRecord {
    pub move_no: usize,
    pub fen: String,
    /// SAN of the move that led into this position
    pub best_move: Option<String>,
    pub eval: EvaluationScore,
}

/// A position whose search or move translation failed
#[derive(Debug, Serialize)]
pub struct PositionFailure {
    pub move_no: usize,
    pub fen: String,
    #[serde(serialize_with = "as_message")]
    pub error: PositionError,
}

pub type PositionResult = Result<AnalysisRecord, PositionFailure>;

fn as_message<S: Serializer>(error: &PositionError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Spawn an engine, analyze `fens` at `depth`, and shut the engine down.
pub async fn analyze(
    config: &EngineConfig,
    fens: &[String],
    depth: u32,
) -> Result<Vec<PositionResult>, AnalysisError> {
    let positions = validate(fens, depth)?;
    if fens.is_empty() {
        return Ok(Vec::new());
    }

    let engine = UciEngine::spawn(config).await?;
    AnalysisPipeline::new(engine, config.clone())
        .run_validated(fens, positions, depth)
        .await
}

/// Check preconditions before any engine command is issued.
pub fn validate(fens: &[String], depth: u32) -> Result<Vec<Chess>, AnalysisError> {
    if depth < 1 {
        return Err(AnalysisError::InvalidDepth(depth));
    }
    fens.iter()
        .enumerate()
        .map(|(index, fen)| {
            board::load_position(fen).map_err(|_| AnalysisError::InvalidFen {
                index,
                fen: fen.clone(),
            })
        })
        .collect()
}

/// Which position to search for record `index`, and in which mode.
///
/// The score is always normalized with the side to move of the position
/// returned here, so a repeated search of N-2 is signed for N-2.
fn search_plan(index: usize, total: usize, policy: FinalPositionPolicy) -> (usize, WaitMode) {
    let last = total - 1;
    if index < last {
        return (index, WaitMode::MoveAndEval);
    }
    match policy {
        FinalPositionPolicy::RepeatPrevious if index > 0 => (index - 1, WaitMode::Eval),
        _ => (index, WaitMode::Eval),
    }
}

pub struct AnalysisPipeline<R = TracingReporter> {
    engine: UciEngine,
    config: EngineConfig,
    reporter: R,
}

impl AnalysisPipeline<TracingReporter> {
    pub fn new(engine: UciEngine, config: EngineConfig) -> Self {
        Self::with_reporter(engine, config, TracingReporter)
    }
}

impl<R: Reporter> AnalysisPipeline<R> {
    pub fn with_reporter(engine: UciEngine, config: EngineConfig, reporter: R) -> Self {
        Self {
            engine,
            config,
            reporter,
        }
    }

    /// Analyze every position in order. Consumes the pipeline: an engine
    /// serves exactly one run.
    pub async fn run(
        self,
        fens: &[String],
        depth: u32,
    ) -> Result<Vec<PositionResult>, AnalysisError> {
        let positions = validate(fens, depth)?;
        self.run_validated(fens, positions, depth).await
    }

    /// `positions` are the parsed `fens`, already checked by [`validate`].
    async fn run_validated(
        mut self,
        fens: &[String],
        positions: Vec<Chess>,
        depth: u32,
    ) -> Result<Vec<PositionResult>, AnalysisError> {
        let total = fens.len();
        info!(total, depth, engine = self.engine.name(), "Starting analysis");

        let mut results = Vec::with_capacity(total);
        let mut pending = PendingMove::None;

        for (i, fen) in fens.iter().enumerate() {
            let interval = self.config.progress_interval;
            if i > 0 && interval > 0 && i % interval == 0 {
                self.reporter.progress(i, total);
            }

            let (target, mode) = search_plan(i, total, self.config.final_position);
            let outcome = match self
                .search(&positions[target], &fens[target], mode, depth)
                .await
            {
                Err(SearchError::Transport(e)) => {
                    self.engine.quit().await;
                    return Err(AnalysisError::Engine(e));
                }
                other => other,
            };

            let previous = std::mem::take(&mut pending);
            let score = outcome.map(|reply| {
                if let Reply::MoveAndEval(Some(raw), _) = &reply {
                    pending = PendingMove::Pending {
                        raw: raw.clone(),
                        source: positions[target].clone(),
                    };
                }
                reply.eval()
            });

            // A mated position has nothing left to search; ignore whatever
            // the engine said about it.
            let score = if board::is_checkmate(&positions[i]) {
                Ok(EvaluationScore::checkmated())
            } else {
                score
            };

            let result = match (previous.translate(), score) {
                (Ok(best_move), Ok(eval)) => Ok(AnalysisRecord {
                    move_no: i,
                    fen: fen.clone(),
                    best_move,
                    eval,
                }),
                (Err(e), _) => Err(PositionError::Translate(e)),
                (_, Err(e)) => Err(PositionError::Search(e)),
            };

            if let Ok(record) = &result {
                debug!(
                    move_no = record.move_no,
                    best_move = record.best_move.as_deref().unwrap_or("-"),
                    eval = %record.eval,
                    "Position analyzed"
                );
            }

            results.push(result.map_err(|error| {
                self.reporter.report(&format!("Position {i}: {error}"));
                PositionFailure {
                    move_no: i,
                    fen: fen.clone(),
                    error,
                }
            }));
        }

        self.engine.quit().await;
        info!(total, "Analysis complete");
        Ok(results)
    }

    /// Run one search to completion or timeout
    async fn search(
        &mut self,
        pos: &Chess,
        fen: &str,
        mode: WaitMode,
        depth: u32,
    ) -> Result<Reply, SearchError> {
        let timeout = self.config.search_timeout;
        // Subscribe first so no output of this search is missed
        let mut sub = self.engine.subscribe();
        self.engine.send(&format!("position fen {fen}")).await?;
        self.engine.send(&format!("go depth {depth}")).await?;

        let mut buffer = Vec::new();
        let side = board::side_to_move(pos);
        let waited = tokio::time::timeout(
            timeout,
            waiter::wait(&mut sub, mode, depth, side, &mut buffer),
        )
        .await;

        match waited {
            Ok(reply) => reply,
            Err(_) => {
                warn!(fen, depth, lines = buffer.len(), "Search timed out, stopping engine");
                self.engine.stop_search(&mut sub, timeout).await?;
                Err(SearchError::Timeout {
                    depth,
                    after: timeout,
                })
            }
        }
    }
}
