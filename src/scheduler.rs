//! Reminder scheduler — the minute-cadence dispatch loop.
//!
//! Owned by the composition root: constructed with an injected store,
//! composer, and mail transport, spawned once at boot, and stoppable via
//! `shutdown()`. `run_tick()` is public so tests can drive a tick without
//! a real timer.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::error::DeliveryError;
use crate::notify::{Composer, MailTransport};
use crate::reminders::Reminder;
use crate::reminders::model::truncate_to_minute;
use crate::store::ReminderStore;

/// Cron expression for the top of every minute.
const EVERY_MINUTE: &str = "0 * * * * *";

pub struct ReminderScheduler {
    store: Arc<dyn ReminderStore>,
    composer: Composer,
    mailer: Arc<dyn MailTransport>,
    schedule: cron::Schedule,
    shutdown: Arc<AtomicBool>,
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<dyn ReminderStore>,
        composer: Composer,
        mailer: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            store,
            composer,
            mailer,
            schedule: cron::Schedule::from_str(EVERY_MINUTE)
                .expect("minute cron expression is valid"),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawn the minute ticker. Runs until `shutdown()` or process exit.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("Reminder scheduler started");
            loop {
                let Some(next) = self.schedule.upcoming(Utc).next() else {
                    break;
                };
                let wait = (next - Utc::now()).to_std().unwrap_or_default();
                tokio::time::sleep(wait).await;

                if self.shutdown.load(Ordering::Relaxed) {
                    tracing::info!("Reminder scheduler shutting down");
                    break;
                }

                self.run_tick(next).await;
            }
        })
    }

    /// Ask the ticker loop to stop before its next tick.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Process every reminder due in the given minute, sequentially.
    /// Returns the number of dispatch attempts made.
    pub async fn run_tick(&self, now: DateTime<Utc>) -> usize {
        let minute_start = truncate_to_minute(now);

        let due = match self.store.find_due(minute_start).await {
            Ok(due) => due,
            Err(e) => {
                tracing::error!("Reminder scheduler query failed: {e}");
                return 0;
            }
        };

        let mut attempted = 0;
        for reminder in due {
            attempted += 1;

            // One failure must not abort the rest of the batch.
            if let Err(e) = self.dispatch(&reminder).await {
                tracing::error!(
                    reminder = %reminder.id,
                    email = %reminder.email,
                    "Error sending reminder email: {e}"
                );
            }

            // One-shot semantics: the record goes away after the attempt,
            // delivered or not.
            if let Err(e) = self.store.delete_reminder(reminder.id).await {
                tracing::error!(reminder = %reminder.id, "Failed to delete reminder: {e}");
            }
        }
        attempted
    }

    async fn dispatch(&self, reminder: &Reminder) -> Result<(), DeliveryError> {
        let body = self
            .composer
            .compose(
                &reminder.plant_name,
                reminder.action,
                reminder.remedy_text.as_deref(),
            )
            .await;

        let subject = format!(
            "🌱 Reminder: {} — {}",
            reminder.action.subject_word(),
            reminder.plant_name
        );

        self.mailer
            .send(&reminder.email, &subject, &body.text, &body.html)
            .await?;

        tracing::info!(
            email = %reminder.email,
            plant = %reminder.plant_name,
            action = %reminder.action,
            "Sent reminder email"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::reminders::ReminderDraft;
    use crate::reminders::model::parse_schedule_date;
    use crate::store::LibSqlBackend;

    #[derive(Debug, Clone)]
    struct SentMail {
        to: String,
        subject: String,
        text: String,
        html: String,
    }

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<SentMail>>,
        fail_for: Option<String>,
    }

    impl RecordingMailer {
        fn failing_for(address: &str) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_for: Some(address.to_string()),
            }
        }

        fn sent(&self) -> Vec<SentMail> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MailTransport for RecordingMailer {
        async fn send(
            &self,
            to: &str,
            subject: &str,
            text: &str,
            html: &str,
        ) -> Result<(), DeliveryError> {
            if self.fail_for.as_deref() == Some(to) {
                return Err(DeliveryError::Transport("connection refused".into()));
            }
            self.sent.lock().unwrap().push(SentMail {
                to: to.to_string(),
                subject: subject.to_string(),
                text: text.to_string(),
                html: html.to_string(),
            });
            Ok(())
        }
    }

    struct AlwaysFailingMailer;

    #[async_trait]
    impl MailTransport for AlwaysFailingMailer {
        async fn send(
            &self,
            _to: &str,
            _subject: &str,
            _text: &str,
            _html: &str,
        ) -> Result<(), DeliveryError> {
            Err(DeliveryError::Transport("connection refused".into()))
        }
    }

    fn draft(email: &str, plant: &str, action: &str, date: &str) -> ReminderDraft {
        ReminderDraft {
            email: email.into(),
            plant_name: plant.into(),
            action: action.into(),
            schedule_date: date.into(),
            remedy_text: None,
        }
    }

    async fn store_with(drafts: &[ReminderDraft]) -> Arc<dyn ReminderStore> {
        let store = LibSqlBackend::new_memory().await.unwrap();
        for d in drafts {
            store.create_reminder(d).await.unwrap();
        }
        Arc::new(store)
    }

    fn scheduler_with(
        store: Arc<dyn ReminderStore>,
        mailer: Arc<dyn MailTransport>,
    ) -> ReminderScheduler {
        ReminderScheduler::new(store, Composer::new(None), mailer)
    }

    #[tokio::test]
    async fn tick_dispatches_due_reminder_and_deletes_it() {
        let store = store_with(&[draft("a@b.com", "Aloe", "water", "2025-06-01T09:00:00Z")]).await;
        let mailer = Arc::new(RecordingMailer::default());
        let scheduler = scheduler_with(Arc::clone(&store), mailer.clone());

        let attempted = scheduler
            .run_tick(parse_schedule_date("2025-06-01T09:00:30Z").unwrap())
            .await;
        assert_eq!(attempted, 1);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@b.com");
        assert!(sent[0].subject.contains("Water"));
        assert!(sent[0].subject.contains("Aloe"));
        assert_eq!(sent[0].text, "Reminder: water for Aloe");
        assert!(sent[0].html.contains("Aloe"));

        assert_eq!(store.count_reminders().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn tick_deletes_reminder_even_when_send_fails() {
        let store = store_with(&[draft("a@b.com", "Aloe", "water", "2025-06-01T09:00:00Z")]).await;
        let scheduler = scheduler_with(Arc::clone(&store), Arc::new(AlwaysFailingMailer));

        let attempted = scheduler
            .run_tick(parse_schedule_date("2025-06-01T09:00:00Z").unwrap())
            .await;
        assert_eq!(attempted, 1);
        assert_eq!(store.count_reminders().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn tick_ignores_reminders_outside_the_minute() {
        let store = store_with(&[draft("a@b.com", "Aloe", "water", "2025-06-01T09:00:00Z")]).await;
        let mailer = Arc::new(RecordingMailer::default());
        let scheduler = scheduler_with(Arc::clone(&store), mailer.clone());

        let attempted = scheduler
            .run_tick(parse_schedule_date("2025-06-01T09:01:00Z").unwrap())
            .await;
        assert_eq!(attempted, 0);
        assert!(mailer.sent().is_empty());
        assert_eq!(store.count_reminders().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn tick_processes_all_reminders_sharing_a_minute() {
        let store = store_with(&[
            draft("a@b.com", "Aloe", "water", "2025-06-01T09:00:00Z"),
            draft("c@d.com", "Fern", "treatment", "2025-06-01T09:00:00Z"),
        ])
        .await;
        let mailer = Arc::new(RecordingMailer::default());
        let scheduler = scheduler_with(Arc::clone(&store), mailer.clone());

        let attempted = scheduler
            .run_tick(parse_schedule_date("2025-06-01T09:00:00Z").unwrap())
            .await;
        assert_eq!(attempted, 2);
        assert_eq!(mailer.sent().len(), 2);
        assert_eq!(store.count_reminders().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn one_failed_send_does_not_abort_the_batch() {
        let store = store_with(&[
            draft("fail@b.com", "Aloe", "water", "2025-06-01T09:00:00Z"),
            draft("ok@d.com", "Fern", "treatment", "2025-06-01T09:00:00Z"),
        ])
        .await;
        let mailer = Arc::new(RecordingMailer::failing_for("fail@b.com"));
        let scheduler = scheduler_with(Arc::clone(&store), mailer.clone());

        let attempted = scheduler
            .run_tick(parse_schedule_date("2025-06-01T09:00:00Z").unwrap())
            .await;
        assert_eq!(attempted, 2);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ok@d.com");
        assert!(sent[0].subject.contains("Treatment"));

        // Both records are gone: failed sends are not retried.
        assert_eq!(store.count_reminders().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_flag_stops_the_ticker() {
        let store = store_with(&[]).await;
        let scheduler = Arc::new(scheduler_with(store, Arc::new(RecordingMailer::default())));

        // Paused time fast-forwards the sleep to the next minute boundary,
        // where the loop observes the flag and exits.
        scheduler.shutdown();
        let handle = Arc::clone(&scheduler).spawn();
        handle.await.unwrap();
    }
}
