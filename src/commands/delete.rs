use async_trait::async_trait;

use super::{Command, CommandResult, Session, parse_task_number};

pub struct DeleteCommand;

#[async_trait]
impl Command for DeleteCommand {
    fn name(&self) -> &str {
        "/delete"
    }

    fn aliases(&self) -> &[&str] {
        &["/rm"]
    }

    fn usage(&self) -> &str {
        "N"
    }

    fn description(&self) -> &str {
        "remove task N"
    }

    async fn execute(&self, args: &str, session: &mut Session) -> CommandResult {
        let removed = parse_task_number(args).and_then(|index| {
            session
                .workflow
                .remove(index)
                .map(|_| index)
                .map_err(|e| e.to_string())
        });
        match removed {
            Ok(index) => println!("  ✓ deleted task {}", index + 1),
            Err(e) => eprintln!("  ✗ {e}"),
        }
        CommandResult::Handled
    }
}
