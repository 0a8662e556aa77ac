use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use trailhead::core::node::NodeState;
use trailhead::{JourneyConfig, JourneyInput, JourneySession, Node, StartOptions};

/// Line-oriented prompts on stdin/stdout.
struct Prompter {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompter {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn ask(&mut self, label: &str) -> Result<String> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(format!("{label}: ").as_bytes()).await?;
        stdout.flush().await?;
        let line = self
            .lines
            .next_line()
            .await?
            .context("stdin closed before the journey finished")?;
        Ok(line.trim_end().to_string())
    }
}

pub async fn run_login(
    config: JourneyConfig,
    journey: &str,
    options: StartOptions,
    logout: bool,
) -> Result<()> {
    let session = trailhead::http_session();
    session.configure(&config).await?;
    let node = session.start(journey, options).await?;
    drive(&session, node, journey, options).await?;
    finish(&session, logout).await
}

pub async fn run_resume(config: JourneyConfig, uri: &str) -> Result<()> {
    let session = trailhead::http_session();
    session.configure(&config).await?;
    let node = session.resume(uri).await?;
    drive(&session, node, "", StartOptions::default()).await?;
    finish(&session, false).await
}

/// Prompt for every Continue node until the journey ends.
///
/// An Error node restarts `journey`; without a journey name (resume) the
/// error is final.
async fn drive(
    session: &JourneySession,
    mut node: Arc<Node>,
    journey: &str,
    options: StartOptions,
) -> Result<()> {
    let mut prompter = Prompter::new();
    loop {
        node = match node.state() {
            NodeState::Continue { callbacks } if node.is_suspended() => {
                for cb in callbacks {
                    println!("{}", cb.label());
                }
                let link = prompter.ask("Paste the link you received").await?;
                session.resume(&link).await?
            }
            NodeState::Continue { callbacks } => {
                let mut input = JourneyInput::new();
                for cb in callbacks {
                    if cb.accepts_input() {
                        let value = prompter.ask(cb.label()).await?;
                        input = input.with(cb.kind().clone(), value);
                    } else {
                        println!("{}", cb.label());
                    }
                }
                session.next(node.id(), &input).await?
            }
            NodeState::Success { .. } => {
                println!("Authenticated.");
                return Ok(());
            }
            NodeState::Error { message } if !journey.is_empty() => {
                println!("{message}, starting over.");
                session.start(journey, options).await?
            }
            NodeState::Error { message } => anyhow::bail!("Journey error: {message}"),
            NodeState::Failure { cause } => anyhow::bail!("Authentication failed: {cause}"),
            NodeState::Unknown { kind } => {
                anyhow::bail!("The server sent a {kind} node this client cannot handle")
            }
        };
    }
}

async fn finish(session: &JourneySession, logout: bool) -> Result<()> {
    match session.session().await? {
        Some(user) => {
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        None => println!("No tokens available (is OIDC configured?)"),
    }
    if logout {
        session.logout().await?;
        println!("Logged out.");
    }
    Ok(())
}
