use async_trait::async_trait;

use super::{Command, CommandResult, Session};

pub struct WhoamiCommand;

#[async_trait]
impl Command for WhoamiCommand {
    fn name(&self) -> &str {
        "/whoami"
    }

    fn description(&self) -> &str {
        "show provider, model, and missing credentials"
    }

    async fn execute(&self, _args: &str, session: &mut Session) -> CommandResult {
        println!("  provider  {} ({})", session.provider, session.model);
        println!("  search    {}", session.search.backend_name());
        if session.missing_keys.is_empty() {
            println!("  keys      ✓");
        } else {
            println!("  missing   {}", session.missing_keys.join(", "));
        }
        CommandResult::Handled
    }
}
