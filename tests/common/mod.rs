use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use engine_analysis::{EngineConfig, Reporter, UciEngine};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// What the scripted engine does on `go depth` for a given position.
#[derive(Clone)]
pub enum Script {
    /// Print these lines
    Reply(Vec<String>),
    /// Print nothing until `stop`, then print this line
    Hang { on_stop: String },
    /// Print nothing, not even after `stop`
    Stall,
    /// Close the connection
    Die,
}

/// Typical engine output for a finished search: a shallower iteration, the
/// requested depth, then `bestmove`.
pub fn search_output(depth: u32, score: &str, bestmove: &str) -> Script {
    Script::Reply(vec![
        format!("info depth {} seldepth {} score cp 1 nodes 20 pv {bestmove}", depth - 1, depth),
        format!("info depth {depth} seldepth {} multipv 1 score {score} nodes 1000 nps 50000 time 20 pv {bestmove}", depth + 3),
        format!("bestmove {bestmove}"),
    ])
}

/// In-memory UCI engine answering from per-FEN scripts.
#[derive(Default)]
pub struct ScriptedEngine {
    scripts: HashMap<String, Script>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, fen: &str, script: Script) -> Self {
        self.scripts.insert(fen.to_string(), script);
        self
    }

    /// Connect a `UciEngine` to this script; the receiver yields every
    /// command the engine was sent.
    pub async fn connect(self, config: &EngineConfig) -> (UciEngine, UnboundedReceiver<String>) {
        let (ours, theirs) = tokio::io::duplex(64 * 1024);
        let (tx, rx) = unbounded_channel();
        tokio::spawn(self.serve(theirs, tx));

        let (read, write) = tokio::io::split(ours);
        let engine = UciEngine::from_io(read, write, config)
            .await
            .expect("handshake with scripted engine");
        (engine, rx)
    }

    async fn serve(self, stream: DuplexStream, commands: UnboundedSender<String>) {
        let (read, mut write) = tokio::io::split(stream);
        let mut lines = BufReader::new(read).lines();
        let mut current_fen = String::new();
        let mut hanging: Option<String> = None;

        while let Ok(Some(cmd)) = lines.next_line().await {
            let _ = commands.send(cmd.clone());

            let reply: Vec<String> = if cmd == "uci" {
                vec![
                    "id name ScriptFish".to_string(),
                    "option name Threads type spin default 1 min 1 max 1024".to_string(),
                    "uciok".to_string(),
                ]
            } else if cmd == "isready" {
                vec!["readyok".to_string()]
            } else if let Some(fen) = cmd.strip_prefix("position fen ") {
                current_fen = fen.to_string();
                continue;
            } else if let Some(depth) = cmd.strip_prefix("go depth ") {
                let depth: u32 = depth.parse().unwrap_or(1);
                let script = self
                    .scripts
                    .get(&current_fen)
                    .cloned()
                    .unwrap_or_else(|| search_output(depth, "cp 0", "(none)"));
                match script {
                    Script::Reply(lines) => lines,
                    Script::Hang { on_stop } => {
                        hanging = Some(on_stop);
                        continue;
                    }
                    Script::Stall => continue,
                    Script::Die => return,
                }
            } else if cmd == "stop" {
                hanging.take().into_iter().collect()
            } else if cmd == "quit" {
                return;
            } else {
                continue;
            };

            let mut out = reply.join("\n");
            out.push('\n');
            if write.write_all(out.as_bytes()).await.is_err() {
                return;
            }
        }
    }
}

/// Everything sent so far
pub fn sent_commands(rx: &mut UnboundedReceiver<String>) -> Vec<String> {
    let mut sent = Vec::new();
    while let Ok(cmd) = rx.try_recv() {
        sent.push(cmd);
    }
    sent
}

pub fn test_config() -> EngineConfig {
    EngineConfig {
        engine_path: "scripted".to_string(),
        threads: 1,
        search_timeout: Duration::from_secs(5),
        ..EngineConfig::default()
    }
}

/// Reporter that keeps every notice for inspection
#[derive(Clone, Default)]
pub struct RecordingReporter {
    pub progress: Arc<Mutex<Vec<(usize, usize)>>>,
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl Reporter for RecordingReporter {
    fn progress(&self, current: usize, total: usize) {
        self.progress.lock().unwrap().push((current, total));
    }

    fn report(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
