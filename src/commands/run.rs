use async_trait::async_trait;
use std::io::{self, Write};
use tokio::sync::broadcast::error::RecvError;

use super::{Command, CommandResult, Session};
use crate::completion::TokenUsage;
use crate::events::Event;
use crate::workflow::total_usage;

pub struct RunCommand;

#[async_trait]
impl Command for RunCommand {
    fn name(&self) -> &str {
        "/run"
    }

    fn usage(&self) -> &str {
        "[INPUT]"
    }

    fn description(&self) -> &str {
        "run the workflow on the given input"
    }

    fn needs_body(&self, args: &str, session: &Session) -> bool {
        args.is_empty() && !session.workflow.is_empty()
    }

    async fn execute(&self, args: &str, session: &mut Session) -> CommandResult {
        if session.workflow.is_empty() {
            println!("  ! add tasks to the workflow before running");
            return CommandResult::Handled;
        }
        if args.trim().is_empty() {
            println!("  ! enter some input text before running the workflow");
            return CommandResult::Handled;
        }
        run_workflow(session, args.trim()).await;
        CommandResult::Handled
    }
}

/// Run the session's workflow, printing task output as it streams in.
/// Ctrl+C stops the run. Returns the number of tasks that completed.
pub async fn run_workflow(session: &mut Session, input: &str) -> usize {
    let interrupt = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    run_workflow_until(session, input, interrupt).await
}

/// Like [`run_workflow`], but stops once `interrupt` resolves. Usage from
/// tasks that finished before the interrupt is still added to the session.
pub async fn run_workflow_until(
    session: &mut Session,
    input: &str,
    interrupt: impl Future<Output = ()>,
) -> usize {
    let mut rx = session.runner.events().subscribe();
    let mut progress = Progress::default();

    let result = {
        let run = session.runner.run(&session.workflow, input);
        tokio::pin!(run);
        tokio::pin!(interrupt);
        loop {
            tokio::select! {
                result = &mut run => break Some(result),
                _ = &mut interrupt => break None,
                event = rx.recv() => match event {
                    Ok(event) => progress.observe(&event),
                    Err(RecvError::Lagged(n)) => eprintln!("\n  (display skipped {n} updates)"),
                    Err(RecvError::Closed) => {}
                },
            }
        }
    };
    while let Ok(event) = rx.try_recv() {
        progress.observe(&event);
    }

    match result {
        Some(Ok(outputs)) => {
            session.usage.add(total_usage(&outputs));
            println!("  ✓ {} task(s) completed", outputs.len());
            outputs.len()
        }
        Some(Err(failure)) => {
            session.usage.add(total_usage(&failure.completed));
            eprintln!("  ✗ {failure}");
            failure.completed.len()
        }
        None => {
            session.usage.add(progress.usage);
            println!("\n\ninterrupted after {} task(s) completed", progress.completed);
            progress.completed
        }
    }
}

/// What the display has seen finish so far.
#[derive(Default)]
struct Progress {
    completed: usize,
    usage: TokenUsage,
}

impl Progress {
    fn observe(&mut self, event: &Event) {
        if let Event::TaskFinished { usage, .. } = event {
            self.completed += 1;
            if let Some(usage) = usage {
                self.usage.add(*usage);
            }
        }
        show(event);
    }
}

fn show(event: &Event) {
    match event {
        Event::TaskStarted { index } => println!("\n### Task {} output\n", index + 1),
        Event::TaskDelta { text, .. } => {
            print!("{text}");
            let _ = io::stdout().flush();
        }
        Event::TaskFinished { .. } => println!("\n\n---"),
        Event::WorkflowStarted { .. }
        | Event::WorkflowFinished { .. }
        | Event::WorkflowFailed { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::test_session;
    use crate::completion::mock::MockCompletion;
    use crate::completion::{Completion, OnDelta, Prompt, TextCompletion};
    use crate::error::Result;
    use crate::workflow::runner::SequentialRunner;
    use std::time::Duration;

    #[tokio::test]
    async fn empty_workflow_warns_and_does_nothing() {
        let mut session = test_session();
        let result = RunCommand.execute("input", &mut session).await;
        assert_eq!(result, CommandResult::Handled);
        assert_eq!(session.usage.total(), 0);
    }

    #[tokio::test]
    async fn empty_input_warns_and_does_nothing() {
        let mut session = test_session();
        session.workflow.add("{input}").unwrap();
        RunCommand.execute("   ", &mut session).await;
        assert_eq!(session.usage.total(), 0);
    }

    #[tokio::test]
    async fn run_accumulates_usage() {
        let mut session = test_session();
        session.workflow.add("Summarize: {input}").unwrap();
        session.workflow.add("Translate: {input}").unwrap();
        let completed = run_workflow(&mut session, "some text").await;
        assert_eq!(completed, 2);
        assert!(session.usage.total() > 0);
    }

    #[tokio::test]
    async fn failure_reports_completed_count() {
        let mut session = test_session();
        session.runner = SequentialRunner::new(Box::new(MockCompletion::scripted(vec![
            Ok("fine".to_string()),
            Err("boom".to_string()),
        ])));
        for p in ["{input}", "{input}", "{input}"] {
            session.workflow.add(p).unwrap();
        }
        assert_eq!(run_workflow(&mut session, "x").await, 1);
        assert_eq!(session.workflow.len(), 3);
    }

    /// Finishes the first task, then never answers again.
    struct StallsAfterFirst;

    #[async_trait]
    impl TextCompletion for StallsAfterFirst {
        fn name(&self) -> &str {
            "stalls"
        }

        async fn complete(&self, prompt: &Prompt, on_delta: &OnDelta) -> Result<Completion> {
            if prompt.last_user() == Some("second") {
                std::future::pending::<()>().await;
            }
            on_delta("first done");
            Ok(Completion {
                text: "first done".to_string(),
                usage: Some(TokenUsage {
                    input_tokens: 100,
                    output_tokens: 50,
                }),
            })
        }
    }

    #[tokio::test]
    async fn interrupt_keeps_usage_of_finished_tasks() {
        let mut session = test_session();
        session.runner = SequentialRunner::new(Box::new(StallsAfterFirst));
        session.workflow.add("{input}").unwrap();
        session.workflow.add("second").unwrap();

        let interrupt = tokio::time::sleep(Duration::from_millis(200));
        let completed = run_workflow_until(&mut session, "x", interrupt).await;

        assert_eq!(completed, 1);
        assert_eq!(session.usage.total(), 150);
        assert_eq!(session.workflow.len(), 2);
    }
}
