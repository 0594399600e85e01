use async_trait::async_trait;

use super::{Command, CommandResult, Session, parse_task_number};

pub struct EditCommand;

#[async_trait]
impl Command for EditCommand {
    fn name(&self) -> &str {
        "/edit"
    }

    fn usage(&self) -> &str {
        "N [PROMPT]"
    }

    fn description(&self) -> &str {
        "replace the prompt of task N"
    }

    fn needs_body(&self, args: &str, _session: &Session) -> bool {
        !args.is_empty() && !args.contains(char::is_whitespace)
    }

    async fn execute(&self, args: &str, session: &mut Session) -> CommandResult {
        let Some((number, prompt)) = args.split_once(char::is_whitespace) else {
            println!("usage: /edit N PROMPT");
            return CommandResult::Handled;
        };
        let index = match parse_task_number(number) {
            Ok(index) => index,
            Err(e) => {
                eprintln!("  ✗ {e}");
                return CommandResult::Handled;
            }
        };
        match session.workflow.edit(index, prompt.trim()) {
            Ok(()) => println!("  ✓ task {} updated", index + 1),
            Err(e) => eprintln!("  ✗ {e}"),
        }
        CommandResult::Handled
    }
}
