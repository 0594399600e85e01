use async_trait::async_trait;

use super::{Command, CommandResult, Session};
use crate::consts::format_number;

pub struct TokensCommand;

#[async_trait]
impl Command for TokensCommand {
    fn name(&self) -> &str {
        "/tokens"
    }

    fn description(&self) -> &str {
        "show session token usage"
    }

    async fn execute(&self, _args: &str, session: &mut Session) -> CommandResult {
        let usage = session.usage;
        if usage.total() == 0 {
            println!("  no tokens used this session");
        } else {
            println!(
                "  {} input + {} output = {} total",
                format_number(usage.input_tokens),
                format_number(usage.output_tokens),
                format_number(usage.total()),
            );
        }
        CommandResult::Handled
    }
}
