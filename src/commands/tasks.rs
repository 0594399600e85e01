use async_trait::async_trait;

use super::{Command, CommandResult, Session};

pub struct TasksCommand;

#[async_trait]
impl Command for TasksCommand {
    fn name(&self) -> &str {
        "/tasks"
    }

    fn aliases(&self) -> &[&str] {
        &["/ls"]
    }

    fn description(&self) -> &str {
        "list workflow tasks"
    }

    async fn execute(&self, _args: &str, session: &mut Session) -> CommandResult {
        if session.workflow.is_empty() {
            println!("  no tasks yet. use /add or /example");
            return CommandResult::Handled;
        }
        for (i, task) in session.workflow.iter().enumerate() {
            println!("── task {} ──", i + 1);
            println!("{task}");
        }
        CommandResult::Handled
    }
}
