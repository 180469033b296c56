use std::time::{Duration, Instant};

use hoist_core::Deployment;

use crate::error::{PhaseError, RunError};
use crate::executor::CommandExecutor;
use crate::fs::HostFs;
use crate::phases::{self, Phase, PhaseContext};

/// Observer of phase progress, used for the start/end markers.
pub trait PhaseListener {
    fn started(&mut self, _phase: Phase) {}
    fn skipped(&mut self, _phase: Phase) {}
    fn completed(&mut self, _phase: Phase, _elapsed: Duration) {}
    fn failed(&mut self, _phase: Phase, _error: &PhaseError) {}
}

/// Listener that ignores every event.
pub struct Silent;

impl PhaseListener for Silent {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    Skipped,
    Applied { elapsed: Duration },
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<(Phase, PhaseOutcome)>,
}

impl RunReport {
    pub fn applied(&self) -> impl Iterator<Item = Phase> + '_ {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, PhaseOutcome::Applied { .. }))
            .map(|(p, _)| *p)
    }

    pub fn skipped(&self) -> impl Iterator<Item = Phase> + '_ {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == PhaseOutcome::Skipped)
            .map(|(p, _)| *p)
    }
}

/// Drives phases in order against one host.
pub struct Provisioner<'a, E: CommandExecutor> {
    ctx: PhaseContext<'a, E>,
}

impl<'a, E: CommandExecutor> Provisioner<'a, E> {
    pub fn new(exec: &'a E, fs: &'a HostFs, deployment: &'a Deployment) -> Self {
        Self {
            ctx: PhaseContext {
                exec,
                fs,
                deployment,
            },
        }
    }

    /// Evaluate a phase's idempotency predicate.
    ///
    /// A predicate that cannot be evaluated counts as "not done".
    pub async fn is_satisfied(&self, phase: Phase) -> bool {
        match phases::is_satisfied(&self.ctx, phase).await {
            Ok(done) => done,
            Err(e) => {
                tracing::warn!(
                    phase = %phase,
                    error = %e,
                    "completion check failed; treating as not done"
                );
                false
            }
        }
    }

    /// Predicate result for every phase, without acting.
    pub async fn survey(&self) -> Vec<(Phase, bool)> {
        let mut states = Vec::with_capacity(Phase::ALL.len());
        for phase in Phase::ALL {
            states.push((phase, self.is_satisfied(phase).await));
        }
        states
    }

    /// Run a single phase: skip when done, otherwise act and re-check.
    pub async fn run_phase(&self, phase: Phase) -> Result<PhaseOutcome, PhaseError> {
        if self.is_satisfied(phase).await {
            tracing::info!(phase = %phase, "already complete, skipping");
            return Ok(PhaseOutcome::Skipped);
        }
        tracing::info!(phase = %phase, "applying");
        let start = Instant::now();
        phases::apply(&self.ctx, phase).await?;
        if !self.is_satisfied(phase).await {
            return Err(PhaseError::Incomplete);
        }
        let elapsed = start.elapsed();
        tracing::info!(phase = %phase, elapsed_ms = elapsed.as_millis() as u64, "phase complete");
        Ok(PhaseOutcome::Applied { elapsed })
    }

    /// Run phases in order, stopping at the first failure.
    pub async fn run(
        &self,
        phases: &[Phase],
        listener: &mut impl PhaseListener,
    ) -> Result<RunReport, RunError> {
        let mut report = RunReport::default();
        for &phase in phases {
            listener.started(phase);
            match self.run_phase(phase).await {
                Ok(outcome) => {
                    match outcome {
                        PhaseOutcome::Skipped => listener.skipped(phase),
                        PhaseOutcome::Applied { elapsed } => listener.completed(phase, elapsed),
                    }
                    report.outcomes.push((phase, outcome));
                }
                Err(e) => {
                    listener.failed(phase, &e);
                    return Err(RunError { phase, source: e });
                }
            }
        }
        Ok(report)
    }
}
