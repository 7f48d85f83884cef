use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use crate::{
    adapter::{ReportError, ReportTarget, StepReporter},
    step::{StepRecord, StepStatus, StepUpdate},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Running,
    InteractionRequired,
}

#[derive(Default)]
struct State {
    // per execution, in creation order
    steps: HashMap<String, Vec<StepRecord>>,
    history: HashMap<String, Vec<StepUpdate>>,
    executions: HashMap<String, ExecutionState>,
    fail_updates: bool,
}

/// Step reporter that keeps everything in process.
///
/// Merges updates into records like the tracking service does, keeps the
/// raw update history, and lets the caller play the user side of an
/// interaction.
#[derive(Default)]
pub struct MemoryStepReporter {
    state: Mutex<State>,
}

impl MemoryStepReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// every update sent for the execution, in order
    pub fn updates(&self, execution_id: &str) -> Vec<StepUpdate> {
        self.state()
            .history
            .get(execution_id)
            .cloned()
            .unwrap_or_default()
    }

    /// the status changes sent for the execution, in order
    pub fn statuses(&self, execution_id: &str) -> Vec<StepStatus> {
        self.updates(execution_id)
            .into_iter()
            .filter_map(|u| u.status)
            .collect()
    }

    pub fn step(&self, execution_id: &str, step_id: &str) -> Option<StepRecord> {
        self.state()
            .steps
            .get(execution_id)
            .and_then(|steps| steps.iter().find(|s| s.id == step_id))
            .cloned()
    }

    pub fn execution_state(&self, execution_id: &str) -> Option<ExecutionState> {
        self.state().executions.get(execution_id).copied()
    }

    /// seed a step record, replacing one with the same id
    pub fn insert_step(&self, execution_id: &str, record: StepRecord) {
        let mut state = self.state();
        let steps = state.steps.entry(execution_id.to_owned()).or_default();
        match steps.iter_mut().find(|s| s.id == record.id) {
            Some(existing) => *existing = record,
            None => steps.push(record),
        }
    }

    /// act as the user answering an interaction
    pub fn interact(&self, execution_id: &str, step_id: &str, approved: bool) {
        let mut state = self.state();
        let steps = state.steps.entry(execution_id.to_owned()).or_default();
        let record = match steps.iter().position(|s| s.id == step_id) {
            Some(index) => &mut steps[index],
            None => {
                steps.push(StepRecord::new(step_id));
                let last = steps.len() - 1;
                &mut steps[last]
            }
        };
        record.interacted = true;
        record.interaction_approved = approved;
        record.interaction_rejected = !approved;
    }

    /// make every following `update_step` fail
    pub fn fail_updates(&self, fail: bool) {
        self.state().fail_updates = fail;
    }
}

#[async_trait::async_trait]
impl StepReporter for MemoryStepReporter {
    async fn update_step(
        &self,
        target: &ReportTarget,
        update: StepUpdate,
    ) -> Result<(), ReportError> {
        let mut state = self.state();
        if state.fail_updates {
            return Err(ReportError::Transport("memory reporter is failing".to_owned()));
        }
        let steps = state.steps.entry(target.execution_id.clone()).or_default();
        match steps.iter_mut().find(|s| s.id == update.id) {
            Some(record) => record.apply(&update),
            None => {
                let mut record = StepRecord::new(&update.id);
                record.apply(&update);
                steps.push(record);
            }
        }
        state
            .history
            .entry(target.execution_id.clone())
            .or_default()
            .push(update);
        Ok(())
    }

    async fn get_step(
        &self,
        target: &ReportTarget,
        step_id: &str,
    ) -> Result<StepRecord, ReportError> {
        self.step(&target.execution_id, step_id)
            .ok_or_else(|| ReportError::StepNotFound(step_id.to_owned()))
    }

    async fn get_steps(&self, target: &ReportTarget) -> Result<Vec<StepRecord>, ReportError> {
        Ok(self
            .state()
            .steps
            .get(&target.execution_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_execution_interaction_required(
        &self,
        target: &ReportTarget,
    ) -> Result<(), ReportError> {
        self.state().executions.insert(
            target.execution_id.clone(),
            ExecutionState::InteractionRequired,
        );
        Ok(())
    }

    async fn set_execution_running(&self, target: &ReportTarget) -> Result<(), ReportError> {
        self.state()
            .executions
            .insert(target.execution_id.clone(), ExecutionState::Running);
        Ok(())
    }
}
