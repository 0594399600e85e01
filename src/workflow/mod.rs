//! The user's ordered list of prompt tasks.
//!
//! A [`Workflow`] is owned by the caller and handed to the
//! [`SequentialRunner`](runner::SequentialRunner) by reference, so the
//! same list can be edited and re-run any number of times.

pub mod runner;
pub mod template;

use std::fmt;

use crate::completion::TokenUsage;
use crate::error::{Error, Result};

/// One prompt template in a workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    prompt: String,
}

impl Task {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prompt)
    }
}

/// What one task produced during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutput {
    /// Zero-based position of the task in the workflow.
    pub index: usize,
    /// The rendered prompt that was sent.
    pub prompt: String,
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// Sum the token usage of a set of outputs.
pub fn total_usage(outputs: &[TaskOutput]) -> TokenUsage {
    let mut total = TokenUsage::default();
    for usage in outputs.iter().filter_map(|o| o.usage) {
        total.add(usage);
    }
    total
}

/// Ordered tasks. Insertion order is execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workflow {
    tasks: Vec<Task>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_prompts<I, S>(prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tasks: prompts.into_iter().map(Task::new).collect(),
        }
    }

    /// Append a task. Returns its index.
    pub fn add(&mut self, prompt: impl Into<String>) -> Result<usize> {
        let prompt = non_blank(prompt.into())?;
        self.tasks.push(Task::new(prompt));
        Ok(self.tasks.len() - 1)
    }

    /// Replace the prompt of the task at `index`.
    pub fn edit(&mut self, index: usize, prompt: impl Into<String>) -> Result<()> {
        let len = self.tasks.len();
        let prompt = non_blank(prompt.into())?;
        let task = self
            .tasks
            .get_mut(index)
            .ok_or(Error::TaskIndex { index, len })?;
        task.prompt = prompt;
        Ok(())
    }

    /// Remove and return the task at `index`. The rest keep their order.
    pub fn remove(&mut self, index: usize) -> Result<Task> {
        self.check(index)?;
        Ok(self.tasks.remove(index))
    }

    /// Move the task at `from` so it ends up at position `to`.
    pub fn move_task(&mut self, from: usize, to: usize) -> Result<()> {
        self.check(from)?;
        self.check(to)?;
        let task = self.tasks.remove(from);
        self.tasks.insert(to, task);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn check(&self, index: usize) -> Result<()> {
        if index < self.tasks.len() {
            Ok(())
        } else {
            Err(Error::TaskIndex {
                index,
                len: self.tasks.len(),
            })
        }
    }
}

fn non_blank(prompt: String) -> Result<String> {
    if prompt.trim().is_empty() {
        Err(Error::Template("task prompt is empty".to_string()))
    } else {
        Ok(prompt)
    }
}
