use async_trait::async_trait;

use super::{Command, CommandResult, Session, parse_task_number};

pub struct MoveCommand;

#[async_trait]
impl Command for MoveCommand {
    fn name(&self) -> &str {
        "/move"
    }

    fn usage(&self) -> &str {
        "FROM TO"
    }

    fn description(&self) -> &str {
        "move a task to another position"
    }

    async fn execute(&self, args: &str, session: &mut Session) -> CommandResult {
        let mut parts = args.split_whitespace();
        let (Some(from), Some(to), None) = (parts.next(), parts.next(), parts.next()) else {
            println!("usage: /move FROM TO");
            return CommandResult::Handled;
        };
        let moved = parse_task_number(from)
            .and_then(|from| parse_task_number(to).map(|to| (from, to)))
            .and_then(|(from, to)| {
                session
                    .workflow
                    .move_task(from, to)
                    .map(|()| (from, to))
                    .map_err(|e| e.to_string())
            });
        match moved {
            Ok((from, to)) => println!("  ✓ moved task {} to {}", from + 1, to + 1),
            Err(e) => eprintln!("  ✗ {e}"),
        }
        CommandResult::Handled
    }
}
