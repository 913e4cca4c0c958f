//! Engine analysis CLI
//!
//! Analyzes a game's positions at a fixed depth with a local UCI engine and
//! prints one JSON entry per position to stdout.
//!
//! Usage: engine-analysis --depth <D> (--fens <file> | --pgn <file>) [--search-final]

use anyhow::{bail, Context};
use serde::Serialize;
use tracing::info;

use engine_analysis::{
    analyze, AnalysisRecord, EngineConfig, FinalPositionPolicy, PositionFailure,
};

enum Source {
    Fens(String),
    Pgn(String),
}

struct Args {
    depth: u32,
    source: Source,
    search_final: bool,
}

/// Parse CLI args by hand; the surface is three flags.
fn parse_args(args: &[String]) -> anyhow::Result<Args> {
    let mut depth = None;
    let mut source = None;
    let mut search_final = false;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--depth" => {
                let value = iter.next().context("--depth needs a value")?;
                depth = Some(value.parse::<u32>().context("--depth must be a positive integer")?);
            }
            "--fens" => {
                let path = iter.next().context("--fens needs a file path")?;
                source = Some(Source::Fens(path.clone()));
            }
            "--pgn" => {
                let path = iter.next().context("--pgn needs a file path")?;
                source = Some(Source::Pgn(path.clone()));
            }
            "--search-final" => search_final = true,
            other => bail!("Unknown argument: {other}"),
        }
    }

    Ok(Args {
        depth: depth.context("--depth is required")?,
        source: source.context("one of --fens or --pgn is required")?,
        search_final,
    })
}

#[derive(Serialize)]
#[serde(untagged)]
enum Entry<'a> {
    Record(&'a AnalysisRecord),
    Failure(&'a PositionFailure),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the JSON result
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let args = parse_args(&args)?;

    let mut config = EngineConfig::load()?;
    if args.search_final {
        config.final_position = FinalPositionPolicy::SearchFinal;
    }
    info!(
        engine_path = %config.engine_path,
        threads = config.threads,
        depth = args.depth,
        "Config loaded"
    );

    let fens = match &args.source {
        Source::Fens(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {path}"))?;
            chess_core::read_fen_list(&text)
        }
        Source::Pgn(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {path}"))?;
            let game = chess_core::parse_pgn(&text)?;
            info!(
                white = %game.metadata.white,
                black = %game.metadata.black,
                moves = game.moves.len(),
                "Parsed PGN"
            );
            game.fens
        }
    };

    let results = analyze(&config, &fens, args.depth).await?;

    let failed = results.iter().filter(|r| r.is_err()).count();
    let entries: Vec<Entry> = results
        .iter()
        .map(|r| match r {
            Ok(record) => Entry::Record(record),
            Err(failure) => Entry::Failure(failure),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&entries)?);

    info!(positions = results.len(), failed, "Done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("engine-analysis")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args() {
        let parsed = parse_args(&args(&["--depth", "14", "--pgn", "game.pgn", "--search-final"]))
            .unwrap();
        assert_eq!(parsed.depth, 14);
        assert!(parsed.search_final);
        assert!(matches!(parsed.source, Source::Pgn(ref p) if p == "game.pgn"));
    }

    #[test]
    fn test_parse_args_requires_depth_and_source() {
        assert!(parse_args(&args(&["--fens", "list.txt"])).is_err());
        assert!(parse_args(&args(&["--depth", "10"])).is_err());
        assert!(parse_args(&args(&["--depth", "ten", "--fens", "x"])).is_err());
        assert!(parse_args(&args(&["--verbose"])).is_err());
    }
}
