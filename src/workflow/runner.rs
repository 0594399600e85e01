use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::template::{Bindings, build_prompt};
use super::{TaskOutput, Workflow};
use crate::completion::TextCompletion;
use crate::error::RunFailure;
use crate::events::{Event, EventBus};

/// Runs a workflow's tasks one after another, feeding each output into
/// the next task as `{input}`.
pub struct SequentialRunner {
    completion: Box<dyn TextCompletion>,
    events: Arc<EventBus>,
}

impl SequentialRunner {
    pub fn new(completion: Box<dyn TextCompletion>) -> Self {
        Self::with_events(completion, Arc::new(EventBus::default()))
    }

    pub fn with_events(completion: Box<dyn TextCompletion>, events: Arc<EventBus>) -> Self {
        Self { completion, events }
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Run every task in order starting from `input`.
    ///
    /// Returns one output per task. The first failure stops the run; the
    /// outputs that did complete come back inside the [`RunFailure`].
    #[instrument(skip_all, fields(tasks = workflow.len(), backend = self.completion.name()))]
    pub async fn run(
        &self,
        workflow: &Workflow,
        input: &str,
    ) -> Result<Vec<TaskOutput>, RunFailure> {
        info!("workflow started");
        self.events.emit(Event::WorkflowStarted {
            tasks: workflow.len(),
        });

        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(workflow.len());
        let mut texts: Vec<String> = Vec::with_capacity(workflow.len());

        for (index, task) in workflow.iter().enumerate() {
            self.events.emit(Event::TaskStarted { index });

            let running = texts.last().map(String::as_str).unwrap_or(input);
            let bindings = Bindings {
                input: running,
                input_text: input,
                outputs: &texts,
            };

            let result = match build_prompt(task.prompt(), &bindings) {
                Ok(prompt) => {
                    let events = Arc::clone(&self.events);
                    let on_delta = move |text: &str| {
                        events.emit(Event::TaskDelta {
                            index,
                            text: text.to_string(),
                        });
                    };
                    let completion = self.completion.complete(&prompt, &on_delta).await;
                    completion.map(|completion| (prompt, completion))
                }
                Err(e) => Err(e),
            };

            let (prompt, completion) = match result {
                Ok(done) => done,
                Err(source) => {
                    warn!(task = index + 1, "task failed: {source}");
                    self.events.emit(Event::WorkflowFailed {
                        index,
                        error: source.to_string(),
                    });
                    return Err(RunFailure {
                        index,
                        completed: outputs,
                        source,
                    });
                }
            };

            info!(task = index + 1, chars = completion.text.len(), "task finished");
            self.events.emit(Event::TaskFinished {
                index,
                output: completion.text.clone(),
                usage: completion.usage,
            });

            texts.push(completion.text.clone());
            outputs.push(TaskOutput {
                index,
                prompt: prompt.to_string(),
                text: completion.text,
                usage: completion.usage,
            });
        }

        info!(completed = outputs.len(), "workflow finished");
        self.events.emit(Event::WorkflowFinished {
            completed: outputs.len(),
        });
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::TokenUsage;
    use crate::completion::mock::MockCompletion;

    #[tokio::test]
    async fn empty_workflow_produces_no_outputs() {
        let mock = Arc::new(MockCompletion::echo());
        let runner = SequentialRunner::new(Box::new(Arc::clone(&mock)));
        let outputs = runner.run(&Workflow::new(), "anything").await.unwrap();
        assert!(outputs.is_empty());
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn output_feeds_next_task() {
        let mock = Arc::new(MockCompletion::replies(["summary", "résumé"]));
        let runner = SequentialRunner::new(Box::new(Arc::clone(&mock)));
        let workflow = Workflow::from_prompts(["Summarize: {input}", "Translate to French: {input}"]);

        let outputs = runner.run(&workflow, "Long article text").await.unwrap();

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].text, "summary");
        assert_eq!(outputs[1].text, "résumé");
        let prompts = mock.prompts();
        assert_eq!(prompts[0].last_user(), Some("Summarize: Long article text"));
        assert_eq!(prompts[1].last_user(), Some("Translate to French: summary"));
    }

    #[tokio::test]
    async fn events_are_emitted_in_order() {
        let runner = SequentialRunner::new(Box::new(MockCompletion::replies(["one"])));
        let mut rx = runner.events().subscribe();
        let workflow = Workflow::from_prompts(["{input}"]);

        runner.run(&workflow, "x").await.unwrap();

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event);
        }
        assert_eq!(
            seen,
            vec![
                Event::WorkflowStarted { tasks: 1 },
                Event::TaskStarted { index: 0 },
                Event::TaskDelta {
                    index: 0,
                    text: "one".to_string()
                },
                Event::TaskFinished {
                    index: 0,
                    output: "one".to_string(),
                    usage: Some(TokenUsage {
                        input_tokens: 1,
                        output_tokens: 1
                    })
                },
                Event::WorkflowFinished { completed: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn template_error_stops_before_calling_model() {
        let mock = Arc::new(MockCompletion::echo());
        let runner = SequentialRunner::new(Box::new(Arc::clone(&mock)));
        let workflow = Workflow::from_prompts(["{input}", "{task_3_output}"]);

        let failure = runner.run(&workflow, "x").await.unwrap_err();

        assert_eq!(failure.index, 1);
        assert_eq!(failure.completed.len(), 1);
        assert_eq!(mock.calls(), 1);
    }
}
