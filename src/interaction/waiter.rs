use std::time::Duration;

use tokio::time::Instant;

use crate::{
    debug, info,
    step::{InteractionState, Line, StepStatus, StepUpdate},
    task::{Response, TaskContext, TaskError},
    warn,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

const TITLE: &str = "Interaction";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    Approved,
    AutoApproved,
    Rejected,
}

impl InteractionOutcome {
    pub fn into_response(self) -> Response {
        match self {
            Self::Approved | Self::AutoApproved => Response::success(),
            Self::Rejected => Response::failure().with_data("status", StepStatus::Canceled.as_str()),
        }
    }
}

enum Poll {
    Interacted(InteractionState),
    TimedOut,
    Canceled,
}

/// Holds a step in `interactionWaiting` until a user answers it in the UI,
/// the timeout approves it, or the step is canceled.
#[derive(Debug, Clone)]
pub struct InteractionWaiter {
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl InteractionWaiter {
    /// `timeout_secs` of 0 waits indefinitely
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        if !poll_interval.is_zero() {
            self.poll_interval = poll_interval;
        }
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Wait for the answer and report the terminal status of the step.
    ///
    /// A cancellation during the wait reports the step canceled and returns
    /// `TaskError::Canceled`.
    pub async fn wait(&self, ctx: &mut TaskContext) -> Result<InteractionOutcome, TaskError> {
        let timeout_secs = self.timeout.map(|t| t.as_secs()).unwrap_or_default();
        let step_id = ctx.step_id().to_owned();
        ctx.progress_mut()
            .report(
                StepUpdate::new(&step_id)
                    .status(StepStatus::InteractionWaiting)
                    .interactive(true)
                    .message(
                        TITLE,
                        vec![
                            Line::primary("Waiting for user interaction"),
                            Line::new(format!("Timeout: {} seconds", timeout_secs)),
                        ],
                    ),
            )
            .await?;

        let reporter = ctx.progress().reporter().clone();
        let target = ctx.progress().target().clone();
        reporter.set_execution_interaction_required(&target).await?;
        info!(
            ctx.logger(),
            { tracker = ctx.tracker() },
            "waiting for interaction, timeout {} seconds",
            timeout_secs
        );

        let polled = self.poll(ctx).await;
        let restored = reporter.set_execution_running(&target).await;
        let polled = match (polled, restored) {
            (Ok(polled), Ok(())) => polled,
            (Ok(_), Err(e)) => return Err(e.into()),
            (Err(e), restored) => {
                if let Err(restore_err) = restored {
                    warn!(
                        ctx.logger(),
                        { tracker = ctx.tracker() },
                        "failed to set execution running: {}",
                        restore_err
                    );
                }
                return Err(e);
            }
        };

        match polled {
            Poll::TimedOut => Ok(InteractionOutcome::AutoApproved),
            Poll::Canceled => {
                ctx.report_canceled().await?;
                Err(TaskError::Canceled)
            }
            Poll::Interacted(state) if state.interaction_rejected => {
                info!(ctx.logger(), { tracker = ctx.tracker() }, "interaction rejected");
                ctx.progress_mut()
                    .report(
                        StepUpdate::new(&step_id)
                            .status(StepStatus::Canceled)
                            .interaction(false, true)
                            .canceled_by(TITLE)
                            .message(
                                TITLE,
                                vec![
                                    Line::danger("Interaction rejected"),
                                    Line::danger("Execution canceled"),
                                ],
                            ),
                    )
                    .await?;
                Ok(InteractionOutcome::Rejected)
            }
            // interacted without a decision counts as approval
            Poll::Interacted(_) => {
                info!(ctx.logger(), { tracker = ctx.tracker() }, "interaction approved");
                ctx.progress_mut()
                    .report(
                        StepUpdate::new(&step_id)
                            .status(StepStatus::Success)
                            .interaction(true, false)
                            .message(TITLE, vec![Line::success("Interaction approved")]),
                    )
                    .await?;
                Ok(InteractionOutcome::Approved)
            }
        }
    }

    async fn poll(&self, ctx: &mut TaskContext) -> Result<Poll, TaskError> {
        let reporter = ctx.progress().reporter().clone();
        let target = ctx.progress().target().clone();
        let step_id = ctx.step_id().to_owned();
        let token = ctx.cancel_token().clone();
        let started = Instant::now();
        loop {
            let record = reporter.get_step(&target, &step_id).await?;
            let state = record.interaction_state();
            if state.interacted {
                return Ok(Poll::Interacted(state));
            }

            let mut wait = self.poll_interval;
            if let Some(timeout) = self.timeout {
                let elapsed = started.elapsed();
                if elapsed >= timeout {
                    info!(
                        ctx.logger(),
                        { tracker = ctx.tracker() },
                        "interaction timed out, approving"
                    );
                    ctx.progress_mut()
                        .report(
                            StepUpdate::new(&step_id)
                                .status(StepStatus::Success)
                                .interaction(true, false)
                                .message(
                                    TITLE,
                                    vec![
                                        Line::warning("Interaction timed out"),
                                        Line::success(
                                            "Automatically approved & continuing to the next step",
                                        ),
                                    ],
                                ),
                        )
                        .await?;
                    return Ok(Poll::TimedOut);
                }
                wait = wait.min(timeout - elapsed);
            }

            debug!(
                ctx.logger(),
                { tracker = ctx.tracker() },
                "no interaction yet, next poll in {:?}",
                wait
            );
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = token.cancelled() => return Ok(Poll::Canceled),
            }
        }
    }
}
