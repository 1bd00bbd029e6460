//! Sequential installer task pipeline.
//!
//! Install steps are inherently order-dependent (detect game, validate,
//! download, apply), so tasks run strictly one at a time and the pipeline
//! halts on the first failure. No rollback: tasks must be individually safe
//! to leave partially applied, or re-runnable from the top.

use crate::context::InstallContext;
use crate::outcome::Outcome;

/// Per-task state machine: `Pending -> Running -> {Succeeded, Warning, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    /// Succeeded with caveats; the pipeline continues.
    Warning,
    /// The pipeline halts here.
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Warning | TaskState::Failed
        )
    }
}

/// Discrete progress events pushed to the driver while the pipeline runs.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    TaskStarted {
        index: usize,
        total: usize,
        name: String,
        /// Always `Running`; the task holds that state until `TaskFinished`.
        state: TaskState,
    },
    /// User-visible status text changed (title and/or detail line).
    Status {
        title: Option<String>,
        detail: Option<String>,
    },
    /// Fractional progress of an in-flight download, in [0, 1].
    DownloadProgress(f64),
    TaskFinished {
        index: usize,
        name: String,
        state: TaskState,
        message: Option<String>,
    },
}

/// Push-style sink for progress events. Invoked from whatever thread performs
/// the I/O; implementations must not block.
pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

/// Sink that discards everything.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_event(&self, _event: ProgressEvent) {}
}

/// Handed to a running task for status/progress side effects. No bearing on
/// control flow.
pub struct StatusHandle<'a> {
    sink: &'a dyn ProgressSink,
}

impl<'a> StatusHandle<'a> {
    /// Handle bound to an arbitrary sink. The pipeline driver builds these for
    /// its tasks; standalone construction is for driving a task directly.
    pub fn for_sink(sink: &'a dyn ProgressSink) -> Self {
        Self { sink }
    }

    pub fn set(&self, title: Option<&str>, detail: Option<&str>) {
        if let Some(title) = title {
            tracing::info!("{}", title);
        }
        if let Some(detail) = detail {
            tracing::info!("  {}", detail);
        }
        self.sink.on_event(ProgressEvent::Status {
            title: title.map(str::to_string),
            detail: detail.map(str::to_string),
        });
    }

    pub fn download_progress(&self, fraction: f64) {
        self.sink.on_event(ProgressEvent::DownloadProgress(fraction));
    }
}

/// A named unit of pipeline work, executed exactly once per run.
pub trait Task {
    fn name(&self) -> &str;

    /// Do the work. The context is exclusively borrowed for the duration of
    /// this call; later tasks observe any mutations.
    fn run(&mut self, ctx: &mut InstallContext, status: &StatusHandle<'_>) -> Outcome;
}

/// Final state of one task after a pipeline run.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub name: String,
    pub state: TaskState,
    pub message: Option<String>,
}

/// Aggregated result of a pipeline run: per-task states plus one terminal outcome.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub tasks: Vec<TaskReport>,
    pub outcome: Outcome,
}

/// Ordered sequence of tasks with fail-fast execution.
pub struct Pipeline {
    tasks: Vec<Box<dyn Task>>,
}

impl Pipeline {
    pub fn new(tasks: Vec<Box<dyn Task>>) -> Self {
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run all tasks in declaration order. Stops at the first `Failed` task;
    /// its message becomes the run's terminal outcome. Warnings are carried
    /// into the terminal outcome but do not halt.
    pub fn run(&mut self, ctx: &mut InstallContext, sink: &dyn ProgressSink) -> PipelineReport {
        let total = self.tasks.len();
        let status = StatusHandle { sink };
        let mut reports: Vec<TaskReport> = Vec::with_capacity(total);
        let mut warnings: Vec<String> = Vec::new();
        let mut failure: Option<String> = None;
        let mut last_info: Option<String> = None;

        for (index, task) in self.tasks.iter_mut().enumerate() {
            let name = task.name().to_string();
            tracing::info!("task started: {} ({}/{})", name, index + 1, total);
            sink.on_event(ProgressEvent::TaskStarted {
                index,
                total,
                name: name.clone(),
                state: TaskState::Running,
            });

            let outcome = task.run(ctx, &status);
            let (state, message) = match &outcome {
                Outcome::Success { message } => (TaskState::Succeeded, message.clone()),
                Outcome::Warning { message } => {
                    warnings.push(message.clone());
                    (TaskState::Warning, Some(message.clone()))
                }
                Outcome::Failure { message } => {
                    failure = Some(message.clone());
                    (TaskState::Failed, Some(message.clone()))
                }
            };
            if state == TaskState::Succeeded {
                if let Some(m) = &message {
                    last_info = Some(m.clone());
                }
            }
            tracing::info!(
                "task finished: {} - {:?}{}",
                name,
                state,
                message.as_deref().map(|m| format!(" ({})", m)).unwrap_or_default()
            );
            sink.on_event(ProgressEvent::TaskFinished {
                index,
                name: name.clone(),
                state,
                message: message.clone(),
            });
            reports.push(TaskReport {
                name,
                state,
                message,
            });

            if state == TaskState::Failed {
                break;
            }
        }

        // Tasks after a failure never start.
        for task in self.tasks.iter().skip(reports.len()) {
            reports.push(TaskReport {
                name: task.name().to_string(),
                state: TaskState::Pending,
                message: None,
            });
        }

        let outcome = if let Some(message) = failure {
            Outcome::failure(message)
        } else if !warnings.is_empty() {
            Outcome::warning(warnings.join("; "))
        } else if let Some(info) = last_info {
            Outcome::success_with(info)
        } else {
            Outcome::success()
        };

        PipelineReport {
            tasks: reports,
            outcome,
        }
    }
}
