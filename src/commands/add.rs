use async_trait::async_trait;

use super::{Command, CommandResult, Session};

pub struct AddCommand;

#[async_trait]
impl Command for AddCommand {
    fn name(&self) -> &str {
        "/add"
    }

    fn usage(&self) -> &str {
        "[PROMPT]"
    }

    fn description(&self) -> &str {
        "append a task to the workflow"
    }

    fn needs_body(&self, args: &str, _session: &Session) -> bool {
        args.is_empty()
    }

    async fn execute(&self, args: &str, session: &mut Session) -> CommandResult {
        match session.workflow.add(args) {
            Ok(index) => println!("  ✓ added task {}", index + 1),
            Err(e) => eprintln!("  ✗ {e}"),
        }
        CommandResult::Handled
    }
}
