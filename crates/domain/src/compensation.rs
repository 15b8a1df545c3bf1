//! Compensation outcome tracking.
//!
//! Every multi-step operation in this crate pairs its forward actions
//! with compensating actions that run in reverse order when a later
//! step fails. An undo step can itself fail; such secondary failures
//! must not escalate the operation beyond its original cause, but they
//! must stay visible. A [`CompensationReport`] carries them on the
//! primary error instead of dropping them in a silent catch.

/// One failed undo step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompensationFailure {
    /// Human-readable label of the undo step that failed.
    pub step: String,
    /// Why it failed.
    pub reason: String,
}

/// Outcome of a compensation pass.
#[derive(Debug, Clone, Default)]
pub struct CompensationReport {
    succeeded: usize,
    failures: Vec<CompensationFailure>,
}

impl CompensationReport {
    /// Creates an empty report (no undo steps attempted yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one undo step that completed.
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    /// Records one undo step that failed.
    pub fn record_failure(&mut self, step: impl Into<String>, reason: impl std::fmt::Display) {
        self.failures.push(CompensationFailure {
            step: step.into(),
            reason: reason.to_string(),
        });
    }

    /// Total undo steps attempted.
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    /// The undo steps that failed.
    pub fn failures(&self) -> &[CompensationFailure] {
        &self.failures
    }

    /// True when every attempted undo step completed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl std::fmt::Display for CompensationReport {
    /// Renders nothing when clean so the report can be embedded
    /// directly in error messages.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_clean() {
            return Ok(());
        }
        write!(
            f,
            " ({} of {} compensation steps failed:",
            self.failures.len(),
            self.attempted()
        )?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, ";")?;
            }
            write!(f, " {}: {}", failure.step, failure.reason)?;
        }
        write!(f, ")")
    }
}
