use async_trait::async_trait;

use super::{Command, CommandResult, Session};

pub struct ClearCommand;

#[async_trait]
impl Command for ClearCommand {
    fn name(&self) -> &str {
        "/clear"
    }

    fn description(&self) -> &str {
        "remove all tasks"
    }

    async fn execute(&self, _args: &str, session: &mut Session) -> CommandResult {
        session.workflow.clear();
        println!("  ✓ workflow cleared");
        CommandResult::Handled
    }
}
