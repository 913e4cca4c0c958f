//! Single-shot wait for the end of a search

use shakmaty::Color;

use crate::engine::{next_line, Subscription};
use crate::error::SearchError;
use crate::eval::{self, EvaluationScore};
use crate::translate::RawMove;

const TERMINATOR: &str = "bestmove";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Only the evaluation is wanted
    Eval,
    /// The evaluation plus the engine's best move
    MoveAndEval,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Eval(EvaluationScore),
    /// `None` when the engine answered `bestmove (none)`
    MoveAndEval(Option<RawMove>, EvaluationScore),
}

impl Reply {
    pub fn eval(&self) -> EvaluationScore {
        match self {
            Reply::Eval(score) | Reply::MoveAndEval(_, score) => *score,
        }
    }
}

/// Collect engine output into `buffer` until the `bestmove` line, then read
/// the score for `depth` from it.
///
/// The subscription must have been taken before the search was started.
/// No timeout is applied here; callers wrap this in `tokio::time::timeout`.
pub async fn wait(
    sub: &mut Subscription,
    mode: WaitMode,
    depth: u32,
    side_to_move: Color,
    buffer: &mut Vec<String>,
) -> Result<Reply, SearchError> {
    loop {
        let line = next_line(sub).await?;
        let done = line.starts_with(TERMINATOR);
        buffer.push(line);
        if done {
            break;
        }
    }

    let score = eval::extract(buffer, depth, side_to_move)?;

    Ok(match mode {
        WaitMode::Eval => Reply::Eval(score),
        WaitMode::MoveAndEval => {
            let token = buffer
                .last()
                .and_then(|line| line.split_whitespace().nth(1))
                .unwrap_or_default();
            Reply::MoveAndEval(RawMove::from_bestmove_token(token), score)
        }
    })
}
