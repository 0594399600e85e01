use async_trait::async_trait;

use super::{Command, CommandResult, Session};
use crate::error::Error;

pub struct SearchCommand;

#[async_trait]
impl Command for SearchCommand {
    fn name(&self) -> &str {
        "/search"
    }

    fn usage(&self) -> &str {
        "QUERY"
    }

    fn description(&self) -> &str {
        "run a web search and print the raw results"
    }

    async fn execute(&self, args: &str, session: &mut Session) -> CommandResult {
        let result = tokio::select! {
            result = session.search.search(args) => result,
            _ = tokio::signal::ctrl_c() => {
                println!("\n\ninterrupted");
                return CommandResult::Handled;
            }
        };
        match result {
            Ok(results) => {
                let pretty = serde_json::to_string_pretty(&results.raw)
                    .unwrap_or_else(|_| results.raw.to_string());
                println!("{pretty}");
            }
            Err(Error::EmptyQuery) => println!("usage: /search QUERY"),
            Err(e) => eprintln!("  ✗ {e}"),
        }
        CommandResult::Handled
    }
}
