//! Pipeline task wrapping a pre-check gate.

use crate::context::InstallContext;
use crate::outcome::Outcome;
use crate::pipeline::{StatusHandle, Task};
use crate::precheck::Gate;

/// Runs a gate before mutating work. A blocking gate failure becomes this
/// task's failure, with the suggested remediation folded into the message.
pub struct PreCheckTask {
    gate: Gate,
}

impl PreCheckTask {
    pub fn new(gate: Gate) -> Self {
        Self { gate }
    }
}

impl Task for PreCheckTask {
    fn name(&self) -> &str {
        "Environment checks"
    }

    fn run(&mut self, ctx: &mut InstallContext, status: &StatusHandle<'_>) -> Outcome {
        status.set(Some("Validating environment"), None);

        let report = self.gate.evaluate(ctx);
        for record in &report.records {
            status.set(
                None,
                Some(&format!(
                    "{}: {}",
                    record.name,
                    if record.result.is_passed() { "ok" } else { "failed" }
                )),
            );
        }

        if let Some(failure) = report.failure() {
            let message = failure
                .result
                .message()
                .unwrap_or("pre-check failed")
                .to_string();
            return match failure.result.retry_label() {
                Some(label) => {
                    Outcome::failure(format!("{} (suggested action: {})", message, label))
                }
                None => Outcome::failure(message),
            };
        }

        let advisories: Vec<&str> = report
            .records
            .iter()
            .filter(|r| !r.blocking && !r.result.is_passed())
            .filter_map(|r| r.result.message())
            .collect();
        if !advisories.is_empty() {
            return Outcome::warning(advisories.join("; "));
        }

        Outcome::success_with("environment checks passed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::NullSink;
    use crate::precheck::{PreCheck, PreCheckResult};

    struct Always(PreCheckResult, bool);

    impl PreCheck for Always {
        fn name(&self) -> &str {
            "always"
        }

        fn blocking(&self) -> bool {
            self.1
        }

        fn evaluate(&mut self, _ctx: &InstallContext) -> PreCheckResult {
            self.0.clone()
        }
    }

    #[test]
    fn gate_failure_becomes_task_failure_with_retry_hint() {
        let gate = Gate::new(vec![Box::new(Always(
            PreCheckResult::failed_retryable("game installation could not be found", "Retry"),
            true,
        ))]);
        let mut task = PreCheckTask::new(gate);
        let mut ctx = InstallContext::default();
        let result = task.run(&mut ctx, &StatusHandle::for_sink(&NullSink));
        assert!(!result.succeeded());
        assert_eq!(
            result.message(),
            Some("game installation could not be found (suggested action: Retry)")
        );
    }

    #[test]
    fn advisory_failures_become_a_warning() {
        let gate = Gate::new(vec![
            Box::new(Always(PreCheckResult::passed(), true)),
            Box::new(Always(PreCheckResult::failed("folder not empty"), false)),
        ]);
        let mut task = PreCheckTask::new(gate);
        let mut ctx = InstallContext::default();
        let result = task.run(&mut ctx, &StatusHandle::for_sink(&NullSink));
        assert!(result.succeeded());
        assert!(result.is_warning());
        assert_eq!(result.message(), Some("folder not empty"));
    }

    #[test]
    fn clean_gate_is_success() {
        let gate = Gate::new(vec![Box::new(Always(PreCheckResult::passed(), true))]);
        let mut task = PreCheckTask::new(gate);
        let mut ctx = InstallContext::default();
        let result = task.run(&mut ctx, &StatusHandle::for_sink(&NullSink));
        assert_eq!(result, Outcome::success_with("environment checks passed"));
    }
}
