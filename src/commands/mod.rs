//! REPL commands prefixed with `/`.
//!
//! Commands implement the [`Command`] trait and are registered in a
//! [`CommandRegistry`]. The registry handles dispatch, alias resolution,
//! and help generation. Each command gets the text after its name and
//! mutable access to the [`Session`].

mod add;
mod clear;
mod delete;
mod edit;
mod example;
mod help;
mod moves;
mod quit;
mod run;
mod search;
mod tasks;
mod tokens;
mod whoami;

pub use run::run_workflow;

use async_trait::async_trait;
use std::sync::Arc;

use crate::completion::TokenUsage;
use crate::search::SearchInvoker;
use crate::workflow::Workflow;
use crate::workflow::runner::SequentialRunner;

/// Everything a REPL session owns.
pub struct Session {
    pub workflow: Workflow,
    pub runner: SequentialRunner,
    pub search: SearchInvoker,
    pub usage: TokenUsage,
    pub provider: String,
    pub model: String,
    /// Credentials the session was started without.
    pub missing_keys: Vec<&'static str>,
}

/// What the REPL should do after a command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    /// Not a command; the REPL treats the line as workflow input.
    NotACommand,
    /// Command handled, continue the REPL loop.
    Handled,
    /// Exit the REPL.
    Quit,
}

/// A REPL command. Implement this trait to add new commands.
#[async_trait]
pub trait Command: Send + Sync {
    /// Primary name, e.g. `"/add"`.
    fn name(&self) -> &str;

    /// Alternative names, e.g. `&["/h", "/?"]`.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Argument synopsis for `/help`, e.g. `"N [PROMPT]"`.
    fn usage(&self) -> &str {
        ""
    }

    /// One-line description for `/help`.
    fn description(&self) -> &str;

    /// Whether the REPL should read a multi-line body (ended by a lone
    /// `.`) before running the command with these inline arguments.
    fn needs_body(&self, _args: &str, _session: &Session) -> bool {
        false
    }

    /// Run the command. `args` is everything after the name.
    async fn execute(&self, args: &str, session: &mut Session) -> CommandResult;
}

/// Holds registered commands.
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a registry with all built-in commands.
    pub fn new() -> Self {
        let commands: Vec<Arc<dyn Command>> = vec![
            Arc::new(help::HelpCommand),
            Arc::new(add::AddCommand),
            Arc::new(example::ExampleCommand),
            Arc::new(tasks::TasksCommand),
            Arc::new(edit::EditCommand),
            Arc::new(delete::DeleteCommand),
            Arc::new(moves::MoveCommand),
            Arc::new(clear::ClearCommand),
            Arc::new(run::RunCommand),
            Arc::new(search::SearchCommand),
            Arc::new(tokens::TokensCommand),
            Arc::new(whoami::WhoamiCommand),
            Arc::new(quit::QuitCommand),
        ];
        Self { commands }
    }

    /// Register an additional command.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.push(command);
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn Command>> {
        self.commands
            .iter()
            .find(|c| c.name() == name || c.aliases().contains(&name))
    }

    /// Whether `input` names a command that wants a multi-line body.
    pub fn needs_body(&self, input: &str, session: &Session) -> bool {
        let (name, args) = split_command(input);
        self.find(name).is_some_and(|c| c.needs_body(args, session))
    }

    /// Dispatch input to a matching command, or return `NotACommand`.
    pub async fn dispatch(&self, input: &str, session: &mut Session) -> CommandResult {
        let (name, args) = split_command(input);

        if let Some(command) = self.find(name) {
            // /help needs the registry to list all commands
            if command.name() == "/help" {
                print!("{}", self.help_text());
                return CommandResult::Handled;
            }
            return command.execute(args, session).await;
        }

        if name.starts_with('/') {
            println!("unknown command: {name}");
            println!("type /help for available commands");
            return CommandResult::Handled;
        }

        CommandResult::NotACommand
    }

    /// Generate help text from all registered commands.
    pub fn help_text(&self) -> String {
        let entries: Vec<(String, &str)> = self
            .commands
            .iter()
            .map(|c| (format_label(c.name(), c.usage(), c.aliases()), c.description()))
            .collect();

        let max_width = entries
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(10);

        let mut out = String::new();
        for (label, desc) in &entries {
            out.push_str(&format!("  {label:<max_width$}  {desc}\n"));
        }
        out.push_str("\n  Commands without inline text read lines until a lone `.`.\n");
        out.push_str("  Any other line runs the workflow with that line as input.\n");
        out
    }

    /// All registered command names.
    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name()).collect()
    }

    /// All registered names and aliases.
    pub fn all_triggers(&self) -> Vec<&str> {
        let mut triggers = Vec::new();
        for cmd in &self.commands {
            triggers.push(cmd.name());
            triggers.extend_from_slice(cmd.aliases());
        }
        triggers
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Split `"/name rest..."` into the name and the (trimmed) rest.
fn split_command(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (input, ""),
    }
}

/// Parse a 1-based task number as shown to the user into an index.
fn parse_task_number(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("not a task number: {}", s.trim())),
    }
}

fn format_label(name: &str, usage: &str, aliases: &[&str]) -> String {
    let mut label = name.to_string();
    if !usage.is_empty() {
        label.push(' ');
        label.push_str(usage);
    }
    if !aliases.is_empty() {
        label.push_str(&format!(" ({})", aliases.join(", ")));
    }
    label
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::completion::mock::MockCompletion;
    use crate::search::mock::MockSearch;

    pub(crate) fn test_session() -> Session {
        Session {
            workflow: Workflow::new(),
            runner: SequentialRunner::new(Box::new(MockCompletion::echo())),
            search: SearchInvoker::new(Box::new(MockSearch::new())),
            usage: TokenUsage::default(),
            provider: "mock".to_string(),
            model: "echo".to_string(),
            missing_keys: Vec::new(),
        }
    }

    #[test]
    fn all_builtins_registered() {
        let reg = CommandRegistry::new();
        let names = reg.names();
        for name in [
            "/help", "/add", "/example", "/tasks", "/edit", "/delete", "/move", "/clear", "/run",
            "/search", "/tokens", "/whoami", "/quit",
        ] {
            assert!(names.contains(&name), "missing: {name}");
        }
    }

    #[test]
    fn no_duplicate_triggers() {
        let reg = CommandRegistry::new();
        let triggers = reg.all_triggers();
        let mut seen = Vec::new();
        for t in &triggers {
            assert!(!seen.contains(t), "duplicate trigger: {t}");
            seen.push(t);
        }
    }

    #[test]
    fn help_text_includes_all_commands() {
        let reg = CommandRegistry::new();
        let text = reg.help_text();
        for name in reg.names() {
            assert!(text.contains(name), "help missing: {name}");
        }
        assert!(text.contains("/h"));
    }

    #[tokio::test]
    async fn unknown_slash_command_is_handled() {
        let reg = CommandRegistry::new();
        let mut session = test_session();
        assert_eq!(
            reg.dispatch("/foobar", &mut session).await,
            CommandResult::Handled
        );
    }

    #[tokio::test]
    async fn plain_text_passes_through() {
        let reg = CommandRegistry::new();
        let mut session = test_session();
        assert_eq!(
            reg.dispatch("Long article text", &mut session).await,
            CommandResult::NotACommand
        );
    }

    #[tokio::test]
    async fn dispatch_passes_args() {
        let reg = CommandRegistry::new();
        let mut session = test_session();
        reg.dispatch("/add Summarize: {input}", &mut session).await;
        assert_eq!(session.workflow.get(0).unwrap().prompt(), "Summarize: {input}");
    }

    #[test]
    fn needs_body_without_inline_text() {
        let reg = CommandRegistry::new();
        let mut session = test_session();
        session.workflow.add("{input}").unwrap();
        assert!(reg.needs_body("/add", &session));
        assert!(!reg.needs_body("/add hello", &session));
        assert!(reg.needs_body("/edit 1", &session));
        assert!(!reg.needs_body("/edit 1 new prompt", &session));
        assert!(reg.needs_body("/run", &session));
        assert!(!reg.needs_body("/tasks", &session));
        assert!(!reg.needs_body("hello", &session));
    }

    #[test]
    fn run_on_empty_workflow_skips_body() {
        let reg = CommandRegistry::new();
        let session = test_session();
        assert!(!reg.needs_body("/run", &session));
    }

    #[test]
    fn split_command_keeps_multiline_args() {
        assert_eq!(
            split_command("/add\n<user>\n{input}\n</user>"),
            ("/add", "<user>\n{input}\n</user>")
        );
        assert_eq!(split_command("  /tasks  "), ("/tasks", ""));
    }

    #[test]
    fn task_numbers_are_one_based() {
        assert_eq!(parse_task_number("1"), Ok(0));
        assert_eq!(parse_task_number(" 3 "), Ok(2));
        assert!(parse_task_number("0").is_err());
        assert!(parse_task_number("two").is_err());
    }

    #[test]
    fn format_label_variants() {
        assert_eq!(format_label("/tasks", "", &[]), "/tasks");
        assert_eq!(format_label("/edit", "N [PROMPT]", &[]), "/edit N [PROMPT]");
        assert_eq!(format_label("/help", "", &["/h", "/?"]), "/help (/h, /?)");
    }
}
