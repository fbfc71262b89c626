//! Notification center seam and in-process implementation.
//!
//! # Responsibility
//! - Define the platform contract for authorization and one-shot reminders.
//! - Provide a tokio-backed center that fires reminders over a channel.
//!
//! # Invariants
//! - Authorization is prompted at most once; a determined status is final.
//! - A reminder fires exactly once, after its delay has elapsed.

use crate::model::contact::ContactId;
use async_trait::async_trait;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Notification permission state reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    NotDetermined,
    Authorized,
    Denied,
}

/// Presentation capabilities requested when prompting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationOptions {
    pub alert: bool,
    pub badge: bool,
    pub sound: bool,
}

impl AuthorizationOptions {
    pub const ALL: Self = Self {
        alert: true,
        badge: true,
        sound: true,
    };
}

/// Visible reminder content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderContent {
    pub title: String,
    pub subtitle: String,
    pub sound: bool,
}

/// One-shot reminder handed to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRequest {
    /// Fresh unique id per request.
    pub id: Uuid,
    pub contact_id: ContactId,
    pub content: ReminderContent,
    /// Fixed interval after which the reminder fires.
    pub fire_after: Duration,
}

/// Failure reported by a platform notification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationCenterError(pub String);

impl Display for NotificationCenterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "notification center error: {}", self.0)
    }
}

impl Error for NotificationCenterError {}

/// Platform notification service contract.
#[async_trait]
pub trait NotificationCenter: Send + Sync {
    async fn authorization_status(&self) -> AuthorizationStatus;

    /// Prompts the user when undetermined; returns whether reminders are allowed.
    async fn request_authorization(
        &self,
        options: AuthorizationOptions,
    ) -> Result<bool, NotificationCenterError>;

    async fn add(&self, request: ReminderRequest) -> Result<(), NotificationCenterError>;
}

/// How the simulated user answers an authorization prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAnswer {
    Grant,
    Deny,
}

/// Tokio-backed notification center delivering fired reminders over a channel.
pub struct InProcessNotificationCenter {
    status: Mutex<AuthorizationStatus>,
    answer: PromptAnswer,
    prompts: AtomicUsize,
    pending: Arc<AtomicUsize>,
    fired: mpsc::UnboundedSender<ReminderRequest>,
}

impl InProcessNotificationCenter {
    /// Creates a center and the receiver that observes fired reminders.
    pub fn new(
        status: AuthorizationStatus,
        answer: PromptAnswer,
    ) -> (Self, mpsc::UnboundedReceiver<ReminderRequest>) {
        let (fired, receiver) = mpsc::unbounded_channel();
        let center = Self {
            status: Mutex::new(status),
            answer,
            prompts: AtomicUsize::new(0),
            pending: Arc::new(AtomicUsize::new(0)),
            fired,
        };
        (center, receiver)
    }

    /// How many times the user has been prompted.
    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::Acquire)
    }

    /// Reminders scheduled but not yet fired.
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    fn current_status(&self) -> AuthorizationStatus {
        match self.status.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl NotificationCenter for InProcessNotificationCenter {
    async fn authorization_status(&self) -> AuthorizationStatus {
        self.current_status()
    }

    async fn request_authorization(
        &self,
        options: AuthorizationOptions,
    ) -> Result<bool, NotificationCenterError> {
        let mut status = self
            .status
            .lock()
            .map_err(|_| NotificationCenterError("authorization state poisoned".to_string()))?;

        if *status == AuthorizationStatus::NotDetermined {
            self.prompts.fetch_add(1, Ordering::AcqRel);
            *status = match self.answer {
                PromptAnswer::Grant => AuthorizationStatus::Authorized,
                PromptAnswer::Deny => AuthorizationStatus::Denied,
            };
            info!(
                "event=notification_prompt module=reminder status=answered granted={} alert={} badge={} sound={}",
                *status == AuthorizationStatus::Authorized,
                options.alert,
                options.badge,
                options.sound
            );
        }

        Ok(*status == AuthorizationStatus::Authorized)
    }

    async fn add(&self, request: ReminderRequest) -> Result<(), NotificationCenterError> {
        if self.current_status() != AuthorizationStatus::Authorized {
            return Err(NotificationCenterError(
                "reminders are not authorized".to_string(),
            ));
        }

        let pending = Arc::clone(&self.pending);
        let fired = self.fired.clone();
        pending.fetch_add(1, Ordering::AcqRel);

        tokio::spawn(async move {
            tokio::time::sleep(request.fire_after).await;
            pending.fetch_sub(1, Ordering::AcqRel);
            debug!(
                "event=reminder_fire module=reminder status=ok reminder_id={} contact_id={}",
                request.id, request.contact_id
            );
            // Receiver dropped means nobody is listening; the reminder still fired.
            let _ = fired.send(request);
        });
        Ok(())
    }
}
