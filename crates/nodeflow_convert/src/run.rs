// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transfer run lifecycle.
//!
//! A run moves through `Planned -> Validated -> Accepted | Rejected`, then
//! `Accepted -> Executing -> Done`. Only an accepted run touches the graph.
//! Execution is a single best-effort pass; a finished run always carries a
//! report, whatever mix of outcomes it holds.

use crate::engine::ConversionEngine;
use crate::executor::TransferReport;
use crate::planner::TransferEntry;
use crate::validator::ValidationIssue;
use nodeflow_graph::{MaterialKind, NodeRef, SceneGraphAdapter};
use std::fmt;

/// Stage of a transfer run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Plan built, not yet checked
    #[default]
    Planned,
    /// Issues collected, awaiting a decision
    Validated,
    /// Cleared to execute
    Accepted,
    /// Abandoned; the graph was never touched
    Rejected,
    /// Applying entries
    Executing,
    /// Report available
    Done,
}

impl RunState {
    /// Whether the run can make no further progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Rejected | RunState::Done)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Planned => "planned",
            RunState::Validated => "validated",
            RunState::Accepted => "accepted",
            RunState::Rejected => "rejected",
            RunState::Executing => "executing",
            RunState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Errors raised by out-of-order run operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    /// The operation is not allowed in the current state
    #[error("cannot {action} a run in state '{from}'")]
    InvalidTransition {
        /// State the run was in
        from: RunState,
        /// Operation attempted
        action: &'static str,
    },
}

/// One plan taken from validation through execution
#[derive(Debug, Clone)]
pub struct TransferRun {
    state: RunState,
    target_kind: MaterialKind,
    entries: Vec<TransferEntry>,
    target: Option<NodeRef>,
    issues: Vec<ValidationIssue>,
    report: Option<TransferReport>,
}

impl TransferRun {
    /// Plan a run from `shaders` onto `target_kind`
    pub fn plan<A>(engine: &ConversionEngine, adapter: &A, shaders: &[NodeRef], target_kind: MaterialKind) -> Self
    where
        A: SceneGraphAdapter + ?Sized,
    {
        Self::from_entries(target_kind, engine.plan_many(adapter, shaders, target_kind))
    }

    /// Start a run from an existing plan
    pub fn from_entries(target_kind: MaterialKind, entries: Vec<TransferEntry>) -> Self {
        Self {
            state: RunState::Planned,
            target_kind,
            entries,
            target: None,
            issues: Vec::new(),
            report: None,
        }
    }

    /// Validate against `target`, which is also where the run will write
    pub fn validate<A>(
        &mut self,
        engine: &ConversionEngine,
        adapter: &A,
        target: Option<NodeRef>,
    ) -> Result<&[ValidationIssue], RunError>
    where
        A: SceneGraphAdapter + ?Sized,
    {
        self.expect_state(RunState::Planned, "validate")?;
        self.issues = engine.validate(adapter, &self.entries, target.as_ref());
        self.target = target;
        self.state = RunState::Validated;
        tracing::info!(
            "Validated {} entries: {} error(s), {} warning(s)",
            self.entries.len(),
            self.error_count(),
            self.issues.len() - self.error_count()
        );
        Ok(&self.issues)
    }

    /// Clear the run to execute
    pub fn accept(&mut self) -> Result<(), RunError> {
        self.expect_state(RunState::Validated, "accept")?;
        self.state = RunState::Accepted;
        Ok(())
    }

    /// Abandon the run
    pub fn reject(&mut self) -> Result<(), RunError> {
        self.expect_state(RunState::Validated, "reject")?;
        self.state = RunState::Rejected;
        tracing::info!("Transfer rejected; graph unchanged");
        Ok(())
    }

    /// Apply the plan
    pub fn execute<A>(&mut self, engine: &ConversionEngine, adapter: &mut A) -> Result<&TransferReport, RunError>
    where
        A: SceneGraphAdapter + ?Sized,
    {
        self.expect_state(RunState::Accepted, "execute")?;
        self.state = RunState::Executing;
        let report = engine.execute(adapter, &self.entries, self.target.as_ref());
        self.state = RunState::Done;
        Ok(self.report.insert(report))
    }

    /// Current stage
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Material kind the plan targets
    pub fn target_kind(&self) -> MaterialKind {
        self.target_kind
    }

    /// Planned entries
    pub fn entries(&self) -> &[TransferEntry] {
        &self.entries
    }

    /// Explicit target, once validated
    pub fn target(&self) -> Option<&NodeRef> {
        self.target.as_ref()
    }

    /// Issues found by validation
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Report, once done
    pub fn report(&self) -> Option<&TransferReport> {
        self.report.as_ref()
    }

    /// Whether validation found an error
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(ValidationIssue::is_error)
    }

    /// Whether validation found a warning
    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|issue| !issue.is_error())
    }

    fn error_count(&self) -> usize {
        self.issues.iter().filter(|issue| issue.is_error()).count()
    }

    fn expect_state(&self, expected: RunState, action: &'static str) -> Result<(), RunError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RunError::InvalidTransition {
                from: self.state,
                action,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{scenario_a, scene};
    use crate::validator::IssueKind;

    #[test]
    fn test_accepted_run_executes() {
        let mut graph = scene();
        let fixture = scenario_a(&mut graph, "");
        let engine = ConversionEngine::new();

        let mut run = TransferRun::plan(
            &engine,
            &graph,
            std::slice::from_ref(&fixture.material),
            MaterialKind::RedshiftStandardMaterial,
        );
        assert_eq!(run.state(), RunState::Planned);
        assert_eq!(run.entries().len(), 2);

        let issues = run.validate(&engine, &graph, None).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::UnsetSource);
        assert!(run.has_warnings());
        assert!(!run.has_errors());

        // Proceed past the warning
        run.accept().unwrap();
        let report = run.execute(&engine, &mut graph).unwrap();
        assert_eq!(report.ok_count, 2);
        assert_eq!(run.state(), RunState::Done);
        assert!(run.state().is_terminal());
        assert!(run.report().is_some());
    }

    #[test]
    fn test_rejected_run_leaves_graph() {
        let mut graph = scene();
        let fixture = scenario_a(&mut graph, "wood.png");
        let engine = ConversionEngine::new();
        let before = graph.node_count();

        let mut run = TransferRun::plan(
            &engine,
            &graph,
            std::slice::from_ref(&fixture.material),
            MaterialKind::RedshiftStandardMaterial,
        );
        run.validate(&engine, &graph, None).unwrap();
        run.reject().unwrap();

        assert_eq!(
            run.execute(&engine, &mut graph).unwrap_err(),
            RunError::InvalidTransition {
                from: RunState::Rejected,
                action: "execute",
            }
        );
        assert_eq!(graph.node_count(), before);
        assert!(run.report().is_none());
    }

    #[test]
    fn test_transitions_enforced() {
        let graph = scene();
        let engine = ConversionEngine::new();
        let mut run = TransferRun::from_entries(MaterialKind::AiStandardSurface, Vec::new());

        assert!(run.accept().is_err());
        run.validate(&engine, &graph, None).unwrap();
        assert!(run.validate(&engine, &graph, None).is_err());
        run.accept().unwrap();
        let err = run.reject().unwrap_err();
        assert_eq!(err.to_string(), "cannot reject a run in state 'accepted'");
    }
}
