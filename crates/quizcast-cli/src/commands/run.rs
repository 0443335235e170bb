//! The `quizcast run` command: the long-lived broadcast service.
//!
//! Wires the core engine to the Telegram transport, spawns the weekly
//! broadcast scheduler, and dispatches inbound updates: subscription
//! commands from anyone, admin commands from the configured operator,
//! and answers (button clicks and text replies) from recipients.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, TimeZone, Utc, Weekday};

use quizcast_core::broadcast::{Broadcaster, BroadcasterConfig};
use quizcast_core::inbound::AnswerRouter;
use quizcast_core::ledger::AnswerLedger;
use quizcast_core::model::RecipientId;
use quizcast_core::parser;
use quizcast_core::registry::{PendingAnswerRegistry, SubscriberRegistry};
use quizcast_core::stats::{CompletionBasis, StatsAggregator};
use quizcast_core::store::AssignmentStore;
use quizcast_core::traits::Transport;
use quizcast_report::text::{self, MESSAGE_LIMIT};
use quizcast_transport::config::{load_config_from, QuizcastConfig};
use quizcast_transport::telegram::{InboundEvent, TelegramTransport};

const WELCOME: &str = "Hi! I broadcast quiz assignments on a schedule.\n\n\
Choice assignments: answer with the buttons.\n\
Text assignments: reply with a plain message.\n\n\
Send /stop to unsubscribe.";

pub async fn execute(config_path: Option<PathBuf>, assignments: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    anyhow::ensure!(
        !config.telegram.token.is_empty(),
        "telegram token is not set; export QUIZCAST_TELEGRAM_TOKEN or edit quizcast.toml"
    );

    let store = Arc::new(AssignmentStore::new());
    let subscribers = Arc::new(SubscriberRegistry::new());
    let pending = Arc::new(PendingAnswerRegistry::new());
    let ledger = Arc::new(AnswerLedger::new());

    let seed_path = assignments.or_else(|| config.assignments_path.clone());
    if let Some(path) = seed_path {
        let parsed = if path.is_dir() {
            parser::load_assignment_directory(&path)?
        } else {
            parser::load_assignment_file(&path)?
        };
        let count = parsed.len();
        for new in parsed {
            store
                .create(new)
                .context("seed assignment failed validation")?;
        }
        tracing::info!(count, "seeded assignments from {}", path.display());
    }

    let transport = Arc::new(
        TelegramTransport::new(&config.telegram.token, config.telegram.base_url.clone())
            .context("failed to construct telegram transport")?,
    );
    let broadcaster = Arc::new(Broadcaster::new(
        Arc::clone(&store),
        Arc::clone(&subscribers),
        Arc::clone(&pending),
        Arc::clone(&transport) as Arc<dyn Transport>,
        BroadcasterConfig {
            parallelism: config.parallelism,
        },
    ));
    let router = AnswerRouter::new(
        Arc::clone(&store),
        Arc::clone(&pending),
        Arc::clone(&ledger),
    );
    let stats = StatsAggregator::new(
        Arc::clone(&store),
        Arc::clone(&ledger),
        Arc::clone(&subscribers),
    );

    spawn_scheduler(&config, Arc::clone(&broadcaster))?;

    let service = Service {
        config,
        store,
        subscribers,
        pending,
        ledger,
        router,
        stats,
        transport: Arc::clone(&transport),
        broadcaster,
    };

    tracing::info!("quizcast service started");
    loop {
        let events = match transport.poll_updates(service.config.poll_timeout_secs).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("poll failed: {e}");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };
        for event in events {
            service.handle_event(event).await;
        }
    }
}

/// Spawn the weekly trigger that fires `broadcast_next` at the
/// configured instants.
fn spawn_scheduler(config: &QuizcastConfig, broadcaster: Arc<Broadcaster>) -> Result<()> {
    let weekdays = config.schedule.parsed_weekdays()?;
    anyhow::ensure!(!weekdays.is_empty(), "schedule has no weekdays");
    anyhow::ensure!(
        config.schedule.hour < 24 && config.schedule.minute < 60,
        "schedule time out of range"
    );
    let (hour, minute) = (config.schedule.hour, config.schedule.minute);

    tokio::spawn(async move {
        loop {
            let Some(fire_at) = next_fire(Utc::now(), &weekdays, hour, minute) else {
                tracing::error!("could not compute next broadcast time; scheduler stopped");
                return;
            };
            let wait = (fire_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            tracing::info!(%fire_at, "next scheduled broadcast");
            tokio::time::sleep(wait).await;

            match broadcaster.broadcast_next().await {
                Some(outcome) => tracing::info!(
                    assignment_id = outcome.assignment_id,
                    delivered = outcome.delivered,
                    "scheduled broadcast done"
                ),
                None => tracing::info!("no assignment waiting for broadcast"),
            }
        }
    });

    Ok(())
}

/// The first instant strictly after `after` that matches one of the
/// weekdays at hour:minute.
fn next_fire(
    after: DateTime<Utc>,
    weekdays: &[Weekday],
    hour: u32,
    minute: u32,
) -> Option<DateTime<Utc>> {
    for day_offset in 0..=7 {
        let date = (after + chrono::Duration::days(day_offset)).date_naive();
        if !weekdays.contains(&date.weekday()) {
            continue;
        }
        let naive = date.and_hms_opt(hour, minute, 0)?;
        let candidate = Utc.from_utc_datetime(&naive);
        if candidate > after {
            return Some(candidate);
        }
    }
    None
}

struct Service {
    config: QuizcastConfig,
    store: Arc<AssignmentStore>,
    subscribers: Arc<SubscriberRegistry>,
    pending: Arc<PendingAnswerRegistry>,
    ledger: Arc<AnswerLedger>,
    router: AnswerRouter,
    stats: StatsAggregator,
    transport: Arc<TelegramTransport>,
    broadcaster: Arc<Broadcaster>,
}

impl Service {
    async fn handle_event(&self, event: InboundEvent) {
        match event {
            InboundEvent::Command {
                recipient,
                command,
                args,
            } => self.handle_command(recipient, &command, &args).await,
            InboundEvent::TextReply { recipient, text } => {
                self.handle_text_reply(recipient, &text).await;
            }
            InboundEvent::ChoiceClick {
                recipient,
                callback_id,
                assignment_id,
                label,
            } => {
                self.handle_choice_click(recipient, &callback_id, assignment_id, &label)
                    .await;
            }
        }
    }

    async fn handle_command(&self, recipient: RecipientId, command: &str, args: &str) {
        match command {
            "start" => {
                if self.subscribers.add(recipient) {
                    tracing::info!(recipient, "subscribed");
                }
                self.reply(recipient, WELCOME).await;
            }
            "stop" => {
                if self.subscribers.remove(recipient) {
                    tracing::info!(recipient, "unsubscribed");
                }
                self.reply(recipient, "You are unsubscribed.").await;
            }
            _ if recipient != self.config.admin_id => {
                // admin commands from anyone else are ignored
            }
            "add" => self.admin_add(recipient, args).await,
            "list" => {
                let out = text::render_assignment_list(&self.store.list());
                self.reply(recipient, &out).await;
            }
            "stats" => {
                let out = text::render_stats_report(&self.store.list(), &self.stats);
                self.reply(recipient, &out).await;
            }
            "leaderboard" => {
                let out = text::render_leaderboard(&self.stats.leaderboard());
                self.reply(recipient, &out).await;
            }
            "user_stats" => {
                let Ok(target) = args.trim().parse::<RecipientId>() else {
                    self.reply(recipient, "Usage: /user_stats <recipient id>").await;
                    return;
                };
                let out = text::render_recipient_details(
                    &self.stats.per_recipient_accuracy(target),
                    &self.store.list(),
                );
                self.reply(recipient, &out).await;
            }
            "progress" => {
                let out = text::render_progress_matrix(
                    &self.stats.progress_matrix(),
                    &self.store.list(),
                    &self.stats,
                );
                self.reply(recipient, &out).await;
            }
            "broadcast" => match self.broadcaster.broadcast_next().await {
                Some(outcome) => {
                    self.reply(
                        recipient,
                        &format!(
                            "Assignment #{} delivered to {} subscriber(s) ({} failed).",
                            outcome.assignment_id, outcome.delivered, outcome.failed
                        ),
                    )
                    .await;
                }
                None => self.reply(recipient, "No unsent assignment.").await,
            },
            "debug" => {
                let last = self
                    .store
                    .list()
                    .last()
                    .map(|a| format!("#{} [{}] {}", a.id, a.kind, a.question))
                    .unwrap_or_else(|| "none".into());
                let completion = self
                    .store
                    .list()
                    .last()
                    .map(|a| {
                        format!(
                            "{:.0}% of subscribers, {:.0}% of answerers",
                            self.stats
                                .completion_rate(a.id, CompletionBasis::Subscribers),
                            self.stats.completion_rate(a.id, CompletionBasis::Answerers),
                        )
                    })
                    .unwrap_or_else(|| "n/a".into());
                let out = format!(
                    "Assignments: {}\nSubscribers: {}\nPending text answers: {}\n\
                     Answers recorded: {}\nLast assignment: {}\nLast completion: {}",
                    self.store.len(),
                    self.subscribers.len(),
                    self.pending.len(),
                    self.ledger.answer_count(),
                    last,
                    completion,
                );
                self.reply(recipient, &out).await;
            }
            other => {
                tracing::debug!(recipient, command = other, "unknown command ignored");
            }
        }
    }

    async fn admin_add(&self, recipient: RecipientId, args: &str) {
        match parser::parse_assignment(args) {
            Ok(new) => match self.store.create(new) {
                Ok(assignment) => {
                    self.reply(
                        recipient,
                        &format!(
                            "Assignment #{} added ({}).",
                            assignment.id, assignment.kind
                        ),
                    )
                    .await;
                }
                Err(e) => self.reply(recipient, &format!("Rejected: {e}")).await,
            },
            Err(e) => self.reply(recipient, &format!("Could not parse: {e}")).await,
        }
    }

    async fn handle_text_reply(&self, recipient: RecipientId, raw_text: &str) {
        match self.router.handle_text(recipient, raw_text) {
            Ok(reply) => {
                self.reply(recipient, &text::render_verdict(&reply)).await;
            }
            Err(e) if e.is_discard() => {
                tracing::debug!(recipient, "text reply discarded: {e}");
            }
            Err(e) => {
                tracing::warn!(recipient, "text reply failed: {e}");
            }
        }
    }

    async fn handle_choice_click(
        &self,
        recipient: RecipientId,
        callback_id: &str,
        assignment_id: u64,
        label: &str,
    ) {
        if let Err(e) = self.transport.answer_callback(callback_id).await {
            tracing::debug!(recipient, "answer_callback failed: {e}");
        }
        match self.router.handle_choice(recipient, assignment_id, label) {
            Ok(reply) => {
                self.reply(recipient, &text::render_verdict(&reply)).await;
            }
            Err(e) if e.is_discard() => {
                tracing::debug!(recipient, assignment_id, "click discarded: {e}");
            }
            Err(e) => {
                tracing::warn!(recipient, assignment_id, "click failed: {e}");
            }
        }
    }

    /// Send a (possibly paginated) reply; delivery problems are logged,
    /// never fatal to the dispatch loop.
    async fn reply(&self, recipient: RecipientId, message: &str) {
        for chunk in text::paginate(message, MESSAGE_LIMIT) {
            if let Err(e) = self.transport.send_text(recipient, &chunk).await {
                tracing::warn!(recipient, "reply failed: {e}");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.from_utc_datetime(
            &NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, 0)
                .unwrap(),
        )
    }

    #[test]
    fn next_fire_same_day_later_time() {
        // 2026-08-24 is a Monday
        let after = utc(2026, 8, 24, 8, 0);
        let fire = next_fire(after, &[Weekday::Mon], 9, 0).unwrap();
        assert_eq!(fire, utc(2026, 8, 24, 9, 0));
    }

    #[test]
    fn next_fire_skips_past_time_today() {
        let after = utc(2026, 8, 24, 10, 0);
        let fire = next_fire(after, &[Weekday::Mon, Weekday::Wed], 9, 0).unwrap();
        // same-day 09:00 already passed, next match is Wednesday
        assert_eq!(fire, utc(2026, 8, 26, 9, 0));
    }

    #[test]
    fn next_fire_wraps_to_next_week() {
        // Friday after the fire time; only Mondays scheduled
        let after = utc(2026, 8, 28, 12, 0);
        let fire = next_fire(after, &[Weekday::Mon], 0, 0).unwrap();
        assert_eq!(fire, utc(2026, 8, 31, 0, 0));
    }

    #[test]
    fn next_fire_exact_instant_moves_on() {
        let after = utc(2026, 8, 24, 9, 0);
        let fire = next_fire(after, &[Weekday::Mon], 9, 0).unwrap();
        // strictly after, so a fire at the exact instant is not repeated
        assert_eq!(fire, utc(2026, 8, 31, 9, 0));
    }
}
