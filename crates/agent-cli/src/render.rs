//! Terminal rendering of agent events and conversation history.

use std::io::{self, Write};

use agent_core::{AgentEvent, Message, Role};
use colored::Colorize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Print events until the sender side is dropped.
pub fn spawn_event_printer(mut event_rx: mpsc::Receiver<AgentEvent>, debug: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut in_reasoning = false;

        while let Some(event) = event_rx.recv().await {
            match event {
                AgentEvent::Reasoning { content } => {
                    if !in_reasoning {
                        print!("{}", "💭 ".dimmed());
                        in_reasoning = true;
                    }
                    print!("{}", content.dimmed());
                    let _ = io::stdout().flush();
                }
                AgentEvent::Token { content } => {
                    if in_reasoning {
                        println!();
                        in_reasoning = false;
                    }
                    print!("{}", content.green());
                    let _ = io::stdout().flush();
                }
                AgentEvent::ToolStart {
                    tool_name,
                    arguments,
                    ..
                } => {
                    in_reasoning = false;
                    println!();
                    println!("{}", format!("🔧 Executing tool: {}", tool_name).yellow());
                    println!("{}", format!("   Args: {}", arguments).dimmed());
                }
                AgentEvent::ToolComplete { result, .. } => {
                    println!("{}", format!("✅ Tool result: {}", result).green());
                }
                AgentEvent::ToolError { error, .. } => {
                    println!("{}", format!("❌ Tool error: {}", error).red());
                }
                AgentEvent::Complete { usage, .. } => {
                    println!();
                    if debug {
                        println!(
                            "{}",
                            format!(
                                "📊 Tokens: prompt={}, completion={}, total={}",
                                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
                            )
                            .dimmed()
                        );
                    }
                }
                AgentEvent::Error { message } => {
                    println!();
                    println!("{}", format!("❌ Error: {}", message).red());
                }
            }
        }
    })
}

pub fn print_history(messages: &[Message]) {
    if messages.is_empty() {
        println!("{}", "(no messages yet)".dimmed());
        return;
    }

    println!("{}", "─".repeat(50).dimmed());
    for message in messages {
        println!("{}", history_line(message));
        if let Some(tool_calls) = &message.tool_calls {
            for call in tool_calls {
                println!(
                    "{}",
                    format!(
                        "   ↳ {} {}({})",
                        call.id, call.function.name, call.function.arguments
                    )
                    .dimmed()
                );
            }
        }
    }
    println!("{}", "─".repeat(50).dimmed());
}

fn history_line(message: &Message) -> String {
    let label = match message.role {
        Role::System => "system".magenta(),
        Role::User => "user".cyan(),
        Role::Assistant => "assistant".green(),
        Role::Tool => "tool".yellow(),
    };

    match &message.tool_call_id {
        Some(id) => format!("[{}:{}] {}", label, id, message.content),
        None => format!("[{}] {}", label, message.content),
    }
}
