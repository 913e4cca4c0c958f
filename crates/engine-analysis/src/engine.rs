//! UCI engine transport (async I/O)
//!
//! Engine output is read by a background task and fanned out through a
//! broadcast channel; every search takes its own subscription.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use tracing::{debug, error, info};

use crate::config::EngineConfig;
use crate::error::EngineError;

/// Lines buffered per subscription before a slow reader starts lagging
const MESSAGE_CAPACITY: usize = 4096;

pub type Subscription = broadcast::Receiver<String>;

/// Handle to a running UCI engine
pub struct UciEngine {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    /// Never read; kept so new subscriptions can be created after the
    /// reader task owns the only sender.
    messages: Subscription,
    reader: JoinHandle<()>,
    process: Option<Child>,
    name: String,
}

impl UciEngine {
    /// Spawn the engine binary and perform the UCI handshake
    pub async fn spawn(config: &EngineConfig) -> Result<Self, EngineError> {
        let mut process = Command::new(&config.engine_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: config.engine_path.clone(),
                source,
            })?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Io(std::io::Error::other("engine stdin not piped")))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Io(std::io::Error::other("engine stdout not piped")))?;

        let mut engine = Self::attach(stdout, stdin);
        engine.process = Some(process);
        engine.handshake(config).await?;
        Ok(engine)
    }

    /// Drive an engine over an arbitrary reader/writer pair
    pub async fn from_io<R, W>(reader: R, writer: W, config: &EngineConfig) -> Result<Self, EngineError>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let mut engine = Self::attach(reader, writer);
        engine.handshake(config).await?;
        Ok(engine)
    }

    fn attach<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (tx, messages) = broadcast::channel(MESSAGE_CAPACITY);
        let reader = tokio::spawn(forward_lines(reader, tx));

        Self {
            writer: Box::new(writer),
            messages,
            reader,
            process: None,
            name: String::new(),
        }
    }

    async fn handshake(&mut self, config: &EngineConfig) -> Result<(), EngineError> {
        let timeout = config.search_timeout;
        let mut sub = self.subscribe();

        self.send("uci").await?;
        let name = tokio::time::timeout(timeout, async {
            let mut name = None;
            loop {
                let line = next_line(&mut sub).await?;
                if let Some(n) = line.strip_prefix("id name ") {
                    name = Some(n.to_string());
                } else if line == "uciok" {
                    return Ok::<_, EngineError>(name);
                }
            }
        })
        .await
        .map_err(|_| EngineError::Handshake {
            expected: "uciok",
            after: timeout,
        })??;
        self.name = name.unwrap_or_else(|| "Unknown Engine".to_string());

        self.send(&format!("setoption name Threads value {}", config.threads))
            .await?;
        self.send("isready").await?;
        tokio::time::timeout(timeout, wait_for(&mut sub, "readyok"))
            .await
            .map_err(|_| EngineError::Handshake {
                expected: "readyok",
                after: timeout,
            })??;

        info!(engine = %self.name, threads = config.threads, "Engine ready");
        Ok(())
    }

    /// Engine name as reported by `id name`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start receiving engine output from this point on
    pub fn subscribe(&self) -> Subscription {
        self.messages.resubscribe()
    }

    /// Send a command line to the engine
    pub async fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        debug!(cmd, "engine <");
        self.writer.write_all(format!("{cmd}\n").as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Abort the running search and consume output up to its `bestmove`.
    pub async fn stop_search(
        &mut self,
        sub: &mut Subscription,
        timeout: Duration,
    ) -> Result<(), EngineError> {
        self.send("stop").await?;
        tokio::time::timeout(timeout, async {
            loop {
                if next_line(sub).await?.starts_with("bestmove") {
                    return Ok::<(), EngineError>(());
                }
            }
        })
        .await
        .map_err(|_| EngineError::Handshake {
            expected: "bestmove",
            after: timeout,
        })?
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        if let Some(process) = self.process.as_mut() {
            let _ = process.wait().await;
        }
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        self.reader.abort();
        if let Some(process) = self.process.as_mut() {
            let _ = process.start_kill();
        }
    }
}

/// Receive the next line, mapping channel failures to transport errors
pub(crate) async fn next_line(sub: &mut Subscription) -> Result<String, EngineError> {
    match sub.recv().await {
        Ok(line) => Ok(line),
        Err(RecvError::Closed) => Err(EngineError::Closed),
        Err(RecvError::Lagged(n)) => Err(EngineError::Lagged(n)),
    }
}

/// Wait for a specific response line
async fn wait_for(sub: &mut Subscription, expected: &str) -> Result<(), EngineError> {
    loop {
        if next_line(sub).await? == expected {
            return Ok(());
        }
    }
}

async fn forward_lines<R>(reader: R, tx: broadcast::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                debug!(line = trimmed, "engine >");
                // No subscribers between searches is fine
                let _ = tx.send(trimmed.to_string());
            }
            Ok(None) => {
                debug!("Engine output closed");
                break;
            }
            Err(e) => {
                error!(error = %e, "Failed to read from engine");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncBufReadExt, AsyncWriteExt, BufReader};

    fn test_config() -> EngineConfig {
        EngineConfig {
            threads: 2,
            search_timeout: Duration::from_secs(5),
            ..EngineConfig::default()
        }
    }

    /// Minimal engine: answers the handshake and records every command.
    async fn fake_engine(
        stream: tokio::io::DuplexStream,
        commands: tokio::sync::mpsc::UnboundedSender<String>,
    ) {
        let (read, mut write) = tokio::io::split(stream);
        let mut lines = BufReader::new(read).lines();
        while let Ok(Some(cmd)) = lines.next_line().await {
            let _ = commands.send(cmd.clone());
            let reply = match cmd.as_str() {
                "uci" => "id name FakeFish 1.0\noption name Threads type spin\nuciok\n",
                "isready" => "readyok\n",
                "stop" => "bestmove e2e4\n",
                "quit" => break,
                _ => continue,
            };
            if write.write_all(reply.as_bytes()).await.is_err() {
                break;
            }
        }
    }

    async fn connect() -> (UciEngine, tokio::sync::mpsc::UnboundedReceiver<String>) {
        let (ours, theirs) = duplex(4096);
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        tokio::spawn(fake_engine(theirs, tx));
        let (read, write) = tokio::io::split(ours);
        let engine = UciEngine::from_io(read, write, &test_config()).await.unwrap();
        (engine, rx)
    }

    #[tokio::test]
    async fn test_handshake_sets_threads() {
        let (engine, mut commands) = connect().await;
        assert_eq!(engine.name(), "FakeFish 1.0");

        let mut sent = Vec::new();
        while let Ok(cmd) = commands.try_recv() {
            sent.push(cmd);
        }
        assert_eq!(sent, vec!["uci", "setoption name Threads value 2", "isready"]);
    }

    #[tokio::test]
    async fn test_stop_search_drains_bestmove() {
        let (mut engine, _commands) = connect().await;
        let mut sub = engine.subscribe();
        engine
            .stop_search(&mut sub, Duration::from_secs(5))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_closed_stream() {
        let (mut engine, _commands) = connect().await;
        let mut sub = engine.subscribe();
        engine.send("quit").await.unwrap();
        assert!(matches!(next_line(&mut sub).await, Err(EngineError::Closed)));
    }

    #[tokio::test]
    async fn test_lagged_subscription_is_transport_error() {
        let (tx, mut sub) = broadcast::channel(1);
        tx.send("info depth 1 score cp 5".to_string()).unwrap();
        tx.send("bestmove e2e4".to_string()).unwrap();

        assert!(matches!(next_line(&mut sub).await, Err(EngineError::Lagged(1))));
    }

    #[tokio::test]
    async fn test_handshake_timeout() {
        let (ours, _silent) = duplex(1024);
        let (read, write) = tokio::io::split(ours);
        let config = EngineConfig {
            search_timeout: Duration::from_millis(50),
            ..test_config()
        };
        let result = UciEngine::from_io(read, write, &config).await;
        assert!(matches!(
            result,
            Err(EngineError::Handshake { expected: "uciok", .. })
        ));
    }
}
