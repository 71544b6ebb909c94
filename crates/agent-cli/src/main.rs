mod logging;
mod render;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use agent_core::tools::ToolExecutor;
use agent_core::{AgentEvent, Session};
use agent_llm::{LLMProvider, OpenAIProvider, ProviderConfig};
use agent_loop::{run_agent_loop_with_config, AgentLoopConfig, DebugLogger};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::settings::ProviderOverrides;

#[derive(Parser)]
#[command(name = "tool-agent")]
#[command(about = "Chat with an OpenAI-compatible model that can call local tools")]
#[command(version)]
struct Cli {
    /// Enable debug logging and the JSON-lines debug log
    #[arg(long, short, global = true)]
    debug: bool,

    /// Write the debug log here instead of ~/.tool-agent/debug.log
    #[arg(long, global = true, env = "TOOL_AGENT_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Maximum request rounds per user message
    #[arg(long, global = true, default_value_t = 20)]
    max_rounds: usize,

    #[command(flatten)]
    provider: ProviderOverrides,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive chat (default)
    Chat,
    /// Send a single message and print the answer
    Ask {
        /// Message content
        message: String,
    },
    /// Print the tool definitions sent to the model
    Tools,
}

/// Everything one user turn needs, shared across turns.
struct Agent {
    llm: Arc<dyn LLMProvider>,
    tools: Arc<dyn ToolExecutor>,
    config: ProviderConfig,
    debug_logger: Arc<DebugLogger>,
    max_rounds: usize,
    debug: bool,
}

impl Agent {
    fn new_session(&self) -> Session {
        let mut session = Session::new(uuid::Uuid::new_v4().to_string());
        session.model = Some(self.config.model.clone());
        session
    }

    fn loop_config(&self) -> AgentLoopConfig {
        AgentLoopConfig {
            max_rounds: self.max_rounds,
            system_prompt: self.config.system_prompt.clone(),
            max_output_tokens: self.config.max_output_tokens,
            debug_logger: Some(Arc::clone(&self.debug_logger)),
            ..Default::default()
        }
    }

    /// Run one user message to completion, rendering events as they arrive.
    async fn turn(&self, session: &mut Session, message: String) -> anyhow::Result<String> {
        let (event_tx, event_rx) = mpsc::channel::<AgentEvent>(256);
        let printer = render::spawn_event_printer(event_rx, self.debug);

        let result = run_agent_loop_with_config(
            session,
            message,
            event_tx,
            Arc::clone(&self.llm),
            Arc::clone(&self.tools),
            self.loop_config(),
        )
        .await;

        // The loop owned the sender; the printer exits once it has drained the channel.
        let _ = printer.await;
        Ok(result?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.debug);

    let tools: Arc<dyn ToolExecutor> = Arc::new(agent_tools::default_registry());

    if let Some(Commands::Tools) = cli.command {
        println!("{}", serde_json::to_string_pretty(&tools.list_tools())?);
        return Ok(());
    }

    let config = cli.provider.load()?;
    log::debug!(
        "Using {} with model '{}' (stream={})",
        config.base_url(),
        config.model,
        config.stream
    );
    let llm: Arc<dyn LLMProvider> = Arc::new(OpenAIProvider::from_config(&config)?);

    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| agent_llm::config::app_dir().join("debug.log"));
    let debug_logger = Arc::new(DebugLogger::new(cli.debug).with_file(log_file));

    let agent = Agent {
        llm,
        tools,
        config,
        debug_logger,
        max_rounds: cli.max_rounds,
        debug: cli.debug,
    };

    match cli.command {
        Some(Commands::Ask { message }) => {
            let mut session = agent.new_session();
            if let Err(error) = agent.turn(&mut session, message).await {
                log::debug!("[{}] Turn failed: {}", session.id, error);
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Commands::Chat) | None => run_interactive_chat(&agent).await,
        Some(Commands::Tools) => Ok(()),
    }
}

async fn run_interactive_chat(agent: &Agent) -> anyhow::Result<()> {
    let mut session = agent.new_session();

    println!("{}", "🤖 tool-agent interactive chat".cyan().bold());
    println!(
        "{}",
        format!("   Model: {} @ {}", agent.config.model, agent.config.base_url()).dimmed()
    );
    println!(
        "{}",
        "   Type 'exit' or 'quit' to leave, /history to show the conversation, /clear to start over"
            .dimmed()
    );
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", ">".cyan().bold());
        std::io::Write::flush(&mut std::io::stdout())?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let input = line.trim();

        match input {
            "" => continue,
            "exit" | "quit" => break,
            "/history" => {
                render::print_history(&session.messages);
                continue;
            }
            "/clear" => {
                session = agent.new_session();
                println!("{}", "🧹 Started a new conversation".dimmed());
                continue;
            }
            _ => {}
        }

        // The event printer has already shown the failure.
        if let Err(error) = agent.turn(&mut session, input.to_string()).await {
            log::debug!("[{}] Turn failed: {}", session.id, error);
        }
        println!();
    }

    println!("{}", "👋 Bye".dimmed());
    Ok(())
}
