use async_trait::async_trait;

use super::{Command, CommandResult, Session};
use crate::consts::{EXAMPLE_FIRST_TASK, EXAMPLE_NEXT_TASK};

pub struct ExampleCommand;

impl ExampleCommand {
    /// The first task restates the input; later ones build on task 1.
    fn template(session: &Session) -> &'static str {
        if session.workflow.is_empty() {
            EXAMPLE_FIRST_TASK
        } else {
            EXAMPLE_NEXT_TASK
        }
    }
}

#[async_trait]
impl Command for ExampleCommand {
    fn name(&self) -> &str {
        "/example"
    }

    fn description(&self) -> &str {
        "append an example task"
    }

    async fn execute(&self, _args: &str, session: &mut Session) -> CommandResult {
        let template = Self::template(session);
        match session.workflow.add(template) {
            Ok(index) => {
                println!("  ✓ added example task {}", index + 1);
                println!("{template}");
            }
            Err(e) => eprintln!("  ✗ {e}"),
        }
        CommandResult::Handled
    }
}
