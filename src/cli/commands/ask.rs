//! One-shot question command.

use crate::agent::Agent;
use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result;

/// Run the ask command: process a single question and print the result.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    json: bool,
    mut settings: Settings,
) -> Result<()> {
    if let Some(model) = model {
        settings.llm.model = model;
    }

    let mut agent = Agent::new(&settings)?;

    let spinner = Output::spinner("Processing...");
    let result = agent.process(question).await;
    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if !result.tool_calls.is_empty() {
        Output::header("Tool Calls");
        for (i, call) in result.tool_calls.iter().enumerate() {
            Output::tool_call(i + 1, &call.tool, &call.input.to_string());
        }
        println!();
    }

    println!("{}", result.answer);
    Ok(())
}
