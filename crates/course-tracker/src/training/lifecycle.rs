//! Registration state machine: `enrolled -> in_progress -> completed`.

use chrono::{DateTime, Utc};

use super::domain::{ProgressPercent, Registration, RegistrationId, RegistrationStatus};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("cannot change status from {from} to {to}: {}", transition_hint(.to))]
    IllegalTransition {
        from: RegistrationStatus,
        to: RegistrationStatus,
    },
    #[error("progress of a completed registration is fixed at 100%")]
    CompletedProgressLocked,
    #[error("registration {0} has been deleted")]
    Deleted(RegistrationId),
}

fn transition_hint(to: &RegistrationStatus) -> &'static str {
    match to {
        RegistrationStatus::Enrolled => "enrolled is only the initial status",
        RegistrationStatus::InProgress => "a course can only be started from enrolled",
        RegistrationStatus::Completed => "only a course in progress can be completed",
    }
}

impl RegistrationStatus {
    /// Only single forward steps are legal; there is no regression and no skipping.
    pub const fn can_advance_to(self, next: RegistrationStatus) -> bool {
        matches!(
            (self, next),
            (Self::Enrolled, Self::InProgress) | (Self::InProgress, Self::Completed)
        )
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// What a progress update did besides storing the new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressChange {
    Recorded,
    /// Progress above zero on an enrolled registration started it.
    Started,
}

impl Registration {
    /// Applies an explicit status change. On error the registration is untouched.
    pub fn advance(
        &mut self,
        target: RegistrationStatus,
        now: DateTime<Utc>,
    ) -> Result<(), LifecycleError> {
        self.ensure_active()?;
        if !self.status.can_advance_to(target) {
            return Err(LifecycleError::IllegalTransition {
                from: self.status,
                to: target,
            });
        }

        match target {
            RegistrationStatus::InProgress => self.start(now),
            RegistrationStatus::Completed => {
                self.completed_at = Some(now);
                self.progress = ProgressPercent::COMPLETE;
                self.status = RegistrationStatus::Completed;
            }
            RegistrationStatus::Enrolled => {}
        }

        Ok(())
    }

    pub fn record_progress(
        &mut self,
        progress: ProgressPercent,
        now: DateTime<Utc>,
    ) -> Result<ProgressChange, LifecycleError> {
        self.ensure_active()?;
        if self.status.is_terminal() && progress != ProgressPercent::COMPLETE {
            return Err(LifecycleError::CompletedProgressLocked);
        }

        self.progress = progress;
        if progress > ProgressPercent::ZERO && self.status == RegistrationStatus::Enrolled {
            self.start(now);
            return Ok(ProgressChange::Started);
        }

        Ok(ProgressChange::Recorded)
    }

    fn start(&mut self, now: DateTime<Utc>) {
        self.status = RegistrationStatus::InProgress;
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    fn ensure_active(&self) -> Result<(), LifecycleError> {
        if self.lifecycle.is_active() {
            Ok(())
        } else {
            Err(LifecycleError::Deleted(self.id))
        }
    }
}
