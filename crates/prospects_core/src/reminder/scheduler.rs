//! Follow-up reminder scheduling.
//!
//! # Responsibility
//! - Walk the authorization state machine for each reminder request.
//! - Build reminder content from a contact and hand it to the platform.
//!
//! # Invariants
//! - A denied status is reported immediately, never re-prompted.
//! - Reminders use a fixed interval delay, never calendar time.
//! - Failures are returned/logged only; they never abort the caller.
//! - Requests are independent; no lock is held across an await.

use crate::model::contact::Contact;
use crate::reminder::center::{
    AuthorizationOptions, AuthorizationStatus, NotificationCenter, NotificationCenterError,
    ReminderContent, ReminderRequest,
};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Default reminder delay.
pub const DEFAULT_REMINDER_DELAY: Duration = Duration::from_secs(5);

/// Per-request lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderState {
    Idle,
    CheckingAuthorization,
    Authorized,
    Denied,
    Scheduled,
    Reported,
}

impl ReminderState {
    fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CheckingAuthorization => "checking_authorization",
            Self::Authorized => "authorized",
            Self::Denied => "denied",
            Self::Scheduled => "scheduled",
            Self::Reported => "reported",
        }
    }
}

/// Reminder scheduling failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderError {
    /// User or platform refused notifications. Not retried automatically.
    AuthorizationDenied,
    /// Delay must be strictly positive.
    InvalidDelay,
    Platform(NotificationCenterError),
}

impl Display for ReminderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthorizationDenied => write!(f, "notification authorization denied"),
            Self::InvalidDelay => write!(f, "reminder delay must be greater than zero"),
            Self::Platform(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ReminderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Platform(err) => Some(err),
            Self::AuthorizationDenied | Self::InvalidDelay => None,
        }
    }
}

impl From<NotificationCenterError> for ReminderError {
    fn from(value: NotificationCenterError) -> Self {
        Self::Platform(value)
    }
}

/// Result of a successful reminder request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledReminder {
    pub request: ReminderRequest,
    /// States visited, starting at `Idle` and ending at `Scheduled`.
    pub transitions: Vec<ReminderState>,
}

/// Builds the visible content for a contact reminder.
pub fn reminder_content(contact: &Contact) -> ReminderContent {
    ReminderContent {
        title: format!("Contact {}", contact.name),
        subtitle: contact.email.clone(),
        sound: true,
    }
}

/// Schedules one-shot follow-up reminders through a notification center.
#[derive(Clone)]
pub struct ReminderScheduler {
    center: Arc<dyn NotificationCenter>,
    default_delay: Duration,
}

impl ReminderScheduler {
    pub fn new(center: Arc<dyn NotificationCenter>) -> Self {
        Self::with_default_delay(center, DEFAULT_REMINDER_DELAY)
    }

    pub fn with_default_delay(center: Arc<dyn NotificationCenter>, default_delay: Duration) -> Self {
        Self {
            center,
            default_delay,
        }
    }

    pub fn default_delay(&self) -> Duration {
        self.default_delay
    }

    /// Schedules a reminder for `contact` firing once `after` has elapsed.
    ///
    /// # Errors
    /// - `ReminderError::AuthorizationDenied` when denied now or at the prompt.
    /// - `ReminderError::InvalidDelay` for a zero delay.
    /// - `ReminderError::Platform` when the center fails.
    pub async fn remind(
        &self,
        contact: &Contact,
        after: Duration,
    ) -> Result<ScheduledReminder, ReminderError> {
        if after.is_zero() {
            return Err(ReminderError::InvalidDelay);
        }

        let mut transitions = vec![ReminderState::Idle];
        advance(&mut transitions, ReminderState::CheckingAuthorization);

        let authorized = match self.center.authorization_status().await {
            AuthorizationStatus::Authorized => true,
            AuthorizationStatus::Denied => false,
            AuthorizationStatus::NotDetermined => {
                debug!(
                    "event=reminder_authorize module=reminder status=prompt contact_id={}",
                    contact.id
                );
                self.center
                    .request_authorization(AuthorizationOptions::ALL)
                    .await?
            }
        };

        if !authorized {
            advance(&mut transitions, ReminderState::Denied);
            advance(&mut transitions, ReminderState::Reported);
            warn!(
                "event=reminder_schedule module=reminder status=denied contact_id={}",
                contact.id
            );
            return Err(ReminderError::AuthorizationDenied);
        }
        advance(&mut transitions, ReminderState::Authorized);

        let request = ReminderRequest {
            id: Uuid::new_v4(),
            contact_id: contact.id,
            content: reminder_content(contact),
            fire_after: after,
        };
        self.center.add(request.clone()).await?;
        advance(&mut transitions, ReminderState::Scheduled);

        info!(
            "event=reminder_schedule module=reminder status=ok contact_id={} reminder_id={} delay_ms={}",
            contact.id,
            request.id,
            after.as_millis()
        );
        Ok(ScheduledReminder {
            request,
            transitions,
        })
    }

    /// Schedules with the configured default delay.
    pub async fn remind_default(
        &self,
        contact: &Contact,
    ) -> Result<ScheduledReminder, ReminderError> {
        self.remind(contact, self.default_delay).await
    }

    /// Runs `remind` on the current tokio runtime without blocking the caller.
    ///
    /// Failures are logged; awaiting the handle is optional.
    pub fn remind_in_background(
        &self,
        contact: Contact,
        after: Duration,
    ) -> JoinHandle<Result<ScheduledReminder, ReminderError>> {
        let scheduler = self.clone();
        tokio::spawn(async move {
            let outcome = scheduler.remind(&contact, after).await;
            if let Err(err) = &outcome {
                warn!(
                    "event=reminder_background module=reminder status=error contact_id={} error={}",
                    contact.id, err
                );
            }
            outcome
        })
    }
}

fn advance(transitions: &mut Vec<ReminderState>, next: ReminderState) {
    if let Some(previous) = transitions.last() {
        debug!(
            "event=reminder_state module=reminder from={} to={}",
            previous.label(),
            next.label()
        );
    }
    transitions.push(next);
}
