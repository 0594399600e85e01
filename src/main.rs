use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use promptline::banner::{BannerInfo, print_banner, print_session_summary};
use promptline::commands::{CommandRegistry, CommandResult, Session, run_workflow};
use promptline::completion::TokenUsage;
use promptline::config::{Provider, Settings};
use promptline::consts::DEFAULT_TIMEOUT_SECS;
use promptline::search::SearchInvoker;
use promptline::workflow::Workflow;
use promptline::workflow::runner::SequentialRunner;

/// Line that ends a multi-line body.
const BODY_END: &str = ".";

#[derive(Parser)]
#[command(
    name = "promptline",
    version,
    about = "Chain prompt tasks through a language model, one after another."
)]
struct Cli {
    /// LLM provider (overrides PROMPTLINE_PROVIDER)
    #[arg(short, long, value_enum)]
    provider: Option<Provider>,

    /// Model name (overrides PROMPTLINE_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Sampling temperature (overrides PROMPTLINE_TEMPERATURE)
    #[arg(long)]
    temperature: Option<f32>,

    /// HTTP request timeout in seconds
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Load a task prompt from a file; repeat to build the workflow in order
    #[arg(long = "task", value_name = "FILE")]
    tasks: Vec<PathBuf>,

    /// Run the loaded tasks once on this input and exit (non-interactive)
    #[arg(short, long)]
    input: Option<String>,

    /// Perform one web search, print the raw JSON, and exit
    #[arg(short, long)]
    search: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    init_logging();
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) => debug!("no .env loaded: {e}"),
    }

    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(provider) = cli.provider {
        settings.provider = provider;
    }
    if cli.model.is_some() {
        settings.model = cli.model.clone();
    }
    if let Some(temperature) = cli.temperature {
        settings.temperature = temperature;
    }
    settings.timeout = Duration::from_secs(cli.timeout);

    let missing_keys = settings.missing_keys();
    for var in &missing_keys {
        warn!("{var} is not set; the features that need it will report an error");
    }

    let workflow = load_tasks(&cli.tasks)?;
    let mut session = Session {
        workflow,
        runner: SequentialRunner::new(settings.completion()?),
        search: SearchInvoker::new(Box::new(settings.search()?)),
        usage: TokenUsage::default(),
        provider: settings.provider.to_string(),
        model: settings.model(),
        missing_keys,
    };

    // Single search mode
    if let Some(query) = cli.search {
        let results = session.search.search(&query).await?;
        println!("{}", serde_json::to_string_pretty(&results.raw)?);
        return Ok(());
    }

    // Single run mode
    if let Some(input) = cli.input {
        if session.workflow.is_empty() {
            bail!("no tasks to run; pass one or more --task FILE");
        }
        let total = session.workflow.len();
        let completed = run_workflow(&mut session, &input).await;
        print_session_summary(session.usage);
        if completed < total {
            bail!("workflow stopped after {completed} of {total} task(s)");
        }
        return Ok(());
    }

    print_banner(&BannerInfo {
        provider: &session.provider,
        model: &session.model,
        search: session.search.backend_name(),
        tasks: session.workflow.len(),
        missing_keys: &session.missing_keys,
    });

    let registry = CommandRegistry::new();
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("\npromptline> ");
        io::stdout().flush()?;

        // Read next line, interruptible by Ctrl+C
        let line = tokio::select! {
            result = lines.next_line() => {
                match result {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        // Ctrl+D (EOF)
                        println!();
                        break;
                    }
                    Err(e) => {
                        eprintln!("input error: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let mut input = line.trim().to_string();
        if input.is_empty() {
            continue;
        }

        if registry.needs_body(&input, &session) {
            let Some(body) = read_body(&mut lines).await? else {
                println!("\n  cancelled");
                continue;
            };
            input.push('\n');
            input.push_str(&body);
        }

        // Long-running commands watch for Ctrl+C themselves.
        match registry.dispatch(&input, &mut session).await {
            CommandResult::Quit => break,
            CommandResult::Handled => {}
            CommandResult::NotACommand => {
                // Plain text is workflow input.
                let run = format!("/run {input}");
                registry.dispatch(&run, &mut session).await;
            }
        }
    }

    print_session_summary(session.usage);
    Ok(())
}

/// Logs go to stderr so streamed output on stdout stays clean.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Collect lines until a lone `.` or EOF. `None` if Ctrl+C cancels it.
async fn read_body<R>(lines: &mut Lines<R>) -> anyhow::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let interrupt = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    read_body_until(lines, interrupt).await
}

async fn read_body_until<R>(
    lines: &mut Lines<R>,
    interrupt: impl Future<Output = ()>,
) -> anyhow::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    println!("  (finish with a line containing only {BODY_END})");
    tokio::pin!(interrupt);
    let mut body = Vec::new();
    loop {
        print!("... ");
        io::stdout().flush()?;
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = &mut interrupt => return Ok(None),
        };
        match line {
            Some(line) if line.trim() == BODY_END => break,
            Some(line) => body.push(line),
            None => break,
        }
    }
    Ok(Some(body.join("\n")))
}

/// Build a workflow from prompt files, in the order given.
fn load_tasks(paths: &[PathBuf]) -> anyhow::Result<Workflow> {
    let mut workflow = Workflow::new();
    for path in paths {
        let prompt = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read task file {}", path.display()))?;
        workflow
            .add(prompt)
            .with_context(|| format!("invalid task file {}", path.display()))?;
    }
    Ok(workflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn body_stops_at_lone_dot() {
        let mut lines = BufReader::new(&b"<user>\n{input}\n</user>\n.\nnext\n"[..]).lines();
        let body = read_body_until(&mut lines, std::future::pending::<()>())
            .await
            .unwrap();
        assert_eq!(body.as_deref(), Some("<user>\n{input}\n</user>"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("next"));
    }

    #[tokio::test]
    async fn body_is_cancelled_by_interrupt() {
        let (reader, _writer) = tokio::io::duplex(64);
        let mut lines = BufReader::new(reader).lines();
        let body = read_body_until(&mut lines, async {}).await.unwrap();
        assert!(body.is_none());
    }

    #[test]
    fn load_tasks_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("1.txt");
        let second = dir.path().join("2.txt");
        std::fs::write(&first, "Summarize: {input}").unwrap();
        std::fs::write(&second, "Translate to French: {input}").unwrap();

        let workflow = load_tasks(&[first, second]).unwrap();

        let prompts: Vec<&str> = workflow.iter().map(|t| t.prompt()).collect();
        assert_eq!(
            prompts,
            vec!["Summarize: {input}", "Translate to French: {input}"]
        );
    }

    #[test]
    fn load_tasks_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_tasks(&[dir.path().join("nope.txt")]).unwrap_err();
        assert!(err.to_string().contains("nope.txt"));
    }

    #[test]
    fn load_tasks_rejects_blank_file() {
        let dir = tempfile::tempdir().unwrap();
        let blank = dir.path().join("blank.txt");
        std::fs::write(&blank, "\n  \n").unwrap();
        assert!(load_tasks(&[blank]).is_err());
    }

    #[test]
    fn cli_parses_repeated_tasks() {
        let cli = Cli::parse_from([
            "promptline",
            "--provider",
            "mock",
            "--task",
            "a.txt",
            "--task",
            "b.txt",
            "--input",
            "hello",
        ]);
        assert_eq!(cli.provider, Some(Provider::Mock));
        assert_eq!(cli.tasks.len(), 2);
        assert_eq!(cli.input.as_deref(), Some("hello"));
        assert_eq!(cli.timeout, DEFAULT_TIMEOUT_SECS);
    }
}
