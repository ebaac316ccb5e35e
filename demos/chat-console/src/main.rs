//! Console demo for the chat runtime.
//!
//! Runs chat turns against the echo model and exposes the tool catalog and
//! dispatcher from the command line.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use mcp_chat::adapters::EchoModel;
use mcp_chat::bootstrap::{self, Runtime};
use mcp_chat::kernel::ChatRequest;
use mcp_chat::primitives::ConversationId;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "chat-console", about = "Drive the tool-augmented chat runtime")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Text the echo model prepends to every answer.
    #[arg(long, default_value = "You said: ")]
    prefix: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send one message, or read messages from stdin when none is given.
    Chat {
        /// Message text.
        message: Option<String>,
        /// Conversation to continue.
        #[arg(long)]
        conversation: Option<String>,
        /// Print the answer as it is streamed.
        #[arg(long)]
        stream: bool,
    },
    /// List the tools of every enabled server.
    Tools,
    /// Execute a tool by name.
    Call {
        /// Tool name.
        tool: String,
        /// Arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
        /// Server to address explicitly.
        #[arg(long)]
        server: Option<String>,
    },
    /// Print the health reports.
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let model = Arc::new(EchoModel::new().with_prefix(cli.prefix));
    let runtime = bootstrap::start(cli.config.as_deref(), model).await?;

    match cli.command {
        Command::Chat {
            message,
            conversation,
            stream,
        } => {
            let conversation = conversation
                .map(ConversationId::new)
                .transpose()
                .context("invalid conversation id")?
                .unwrap_or_else(ConversationId::generate);
            match message {
                Some(message) => turn(&runtime, &conversation, message, stream).await?,
                None => {
                    let stdin = BufReader::new(tokio::io::stdin());
                    interactive(&runtime, &conversation, stream, stdin).await?;
                }
            }
        }
        Command::Tools => {
            for tool in runtime.registry().list_all_tools() {
                println!("{}/{}: {}", tool.server_id(), tool.name(), tool.description());
            }
        }
        Command::Call { tool, args, server } => {
            let Value::Object(arguments) =
                serde_json::from_str::<Value>(&args).context("arguments are not valid JSON")?
            else {
                bail!("arguments must be a JSON object");
            };
            let result = match server {
                Some(server) => runtime.dispatcher().execute_on(&server, &tool, arguments).await,
                None => runtime.dispatcher().execute(&tool, arguments).await,
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Health => {
            println!("{}", serde_json::to_string_pretty(&runtime.health())?);
        }
    }

    Ok(())
}

async fn interactive<R>(
    runtime: &Runtime,
    conversation: &ConversationId,
    stream: bool,
    input: R,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    info!(conversation_id = %conversation, "reading messages");
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        turn(runtime, conversation, line.to_owned(), stream).await?;
    }

    let history = runtime.chat().conversation(conversation).await;
    info!(conversation_id = %conversation, messages = history.len(), "session finished");
    Ok(())
}

async fn turn(
    runtime: &Runtime,
    conversation: &ConversationId,
    message: String,
    stream: bool,
) -> Result<()> {
    let request = ChatRequest::new(message).with_conversation_id(conversation.clone());
    if !stream {
        let response = runtime.chat().chat(request).await;
        println!("{}", response.message);
        return Ok(());
    }

    let mut events = runtime.chat().chat_stream(request).await;
    let mut stdout = std::io::stdout();
    while let Some(event) = events.next().await {
        write!(stdout, "{}", event.delta)?;
        stdout.flush()?;
    }
    writeln!(stdout)?;
    Ok(())
}
