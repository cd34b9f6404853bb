//! Interactive chat command.

use crate::agent::Agent;
use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, mut settings: Settings) -> Result<()> {
    if let Some(model) = model {
        settings.llm.model = model;
    }

    let mut agent = Agent::new(&settings)?;

    println!("\n{}", style("Kino Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about movies and TV shows, or 'exit' to quit. Use 'clear' to reset conversation.")
            .dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            agent.clear();
            Output::info("Conversation history cleared.");
            continue;
        }

        let spinner = Output::spinner("Processing...");
        let result = agent.process(input).await;
        spinner.finish_and_clear();

        if !result.tool_calls.is_empty() {
            for (i, call) in result.tool_calls.iter().enumerate() {
                Output::tool_call(i + 1, &call.tool, &call.input.to_string());
            }
        }

        println!("\n{} {}\n", style("Kino:").cyan().bold(), result.answer);
    }

    Ok(())
}
