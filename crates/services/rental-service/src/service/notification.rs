//! Notification dispatcher.
//!
//! Messages are sent on a detached task after the transition that triggered
//! them has committed. A delivery failure is logged and never reaches the
//! caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use domain::profile::normalize_locale;
use domain::Profile;

use super::templates::{self, Rendered};
use crate::integrations::{Mailer, OutboundEmail};

/// The two transactional messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Sent by `assign_and_confirm`
    BookingConfirmed {
        customer_name: String,
        vehicle: String,
        plate: String,
        pickup_at: DateTime<Utc>,
    },
    /// Sent by `finalize_submission`
    SubmissionReceived {
        customer_name: String,
        vehicle: Option<String>,
    },
}

impl Notice {
    pub fn template(&self) -> &'static str {
        match self {
            Notice::BookingConfirmed { .. } => "booking-confirmed",
            Notice::SubmissionReceived { .. } => "submission-received",
        }
    }

    pub fn render(&self, locale: &str) -> Rendered {
        match self {
            Notice::BookingConfirmed {
                customer_name,
                vehicle,
                plate,
                pickup_at,
            } => templates::booking_confirmed(
                locale,
                customer_name,
                vehicle,
                plate,
                &pickup_at.format("%d/%m/%Y %H:%M").to_string(),
            ),
            Notice::SubmissionReceived {
                customer_name,
                vehicle,
            } => templates::submission_received(locale, customer_name, vehicle.as_deref()),
        }
    }
}

/// Fire-and-forget sender for transactional messages.
#[derive(Clone)]
pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
}

impl NotificationDispatcher {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    /// Render `notice` in the recipient's locale and send it in the
    /// background. The handle resolves once delivery was attempted.
    pub fn dispatch(&self, recipient: &Profile, notice: Notice) -> JoinHandle<()> {
        let locale = normalize_locale(Some(&recipient.locale));
        let Rendered { subject, text } = notice.render(&locale);
        let email = OutboundEmail {
            to: recipient.email.clone(),
            template: notice.template(),
            locale,
            subject,
            text,
        };
        let profile_id = recipient.id;
        let mailer = self.mailer.clone();

        tokio::spawn(async move {
            match mailer.send(&email).await {
                Ok(()) => tracing::info!(
                    profile_id = %profile_id,
                    template = email.template,
                    "Notification accepted"
                ),
                Err(e) => tracing::warn!(
                    profile_id = %profile_id,
                    template = email.template,
                    error = %e,
                    "Notification failed, transition kept"
                ),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::MockMailer;
    use common::AppError;
    use domain::NewProfile;
    use uuid::Uuid;

    fn recipient(locale: &str) -> Profile {
        Profile::register(
            Uuid::new_v4(),
            NewProfile {
                full_name: "Amina El Idrissi".to_string(),
                email: "amina@example.com".to_string(),
                phone: None,
                country: None,
                locale: Some(locale.to_string()),
            },
        )
    }

    #[tokio::test]
    async fn test_dispatch_renders_in_profile_locale() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|email| {
                email.to == "amina@example.com"
                    && email.locale == "en"
                    && email.template == "submission-received"
                    && email.subject.starts_with("Request Received")
            })
            .times(1)
            .returning(|_| Ok(()));

        let dispatcher = NotificationDispatcher::new(Arc::new(mailer));
        let notice = Notice::SubmissionReceived {
            customer_name: "Amina".to_string(),
            vehicle: None,
        };
        dispatcher.dispatch(&recipient("en-US"), notice).await.unwrap();
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .times(1)
            .returning(|_| Err(AppError::external("mail API down")));

        let dispatcher = NotificationDispatcher::new(Arc::new(mailer));
        let notice = Notice::BookingConfirmed {
            customer_name: "Amina".to_string(),
            vehicle: "Dacia Duster".to_string(),
            plate: "12345-A-6".to_string(),
            pickup_at: Utc::now(),
        };
        let handle = dispatcher.dispatch(&recipient("fr"), notice);
        assert!(handle.await.is_ok());
    }
}
