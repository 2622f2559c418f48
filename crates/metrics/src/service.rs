use invite_models::{BotError, BroadcastReport, RefreshReport, SyncReport};
use prometheus::{Counter, Encoder, Histogram, HistogramOpts, Registry, TextEncoder};
use tracing::debug;

pub struct MetricsService {
    registry: Registry,
    updates_total: Counter,
    update_errors_total: Counter,
    messages_sent_total: Counter,
    message_failures_total: Counter,
    members_removed_total: Counter,
    chats_removed_total: Counter,
    broadcast_duration_ms: Histogram,
}

impl MetricsService {
    pub fn new() -> Result<Self, BotError> {
        let registry = Registry::new();

        let updates_total = counter("invite_bot_updates_total", "Total number of Telegram updates processed")?;
        let update_errors_total = counter(
            "invite_bot_update_errors_total",
            "Total number of updates whose handler failed",
        )?;
        let messages_sent_total = counter(
            "invite_bot_messages_sent_total",
            "Total number of broadcast messages delivered",
        )?;
        let message_failures_total = counter(
            "invite_bot_message_failures_total",
            "Total number of broadcast messages that failed",
        )?;
        let members_removed_total = counter(
            "invite_bot_members_removed_total",
            "Total number of target chat members removed by sync",
        )?;
        let chats_removed_total = counter(
            "invite_bot_chats_removed_total",
            "Total number of chats dropped during refresh",
        )?;

        let broadcast_duration_ms = Histogram::with_opts(
            HistogramOpts::new(
                "invite_bot_broadcast_duration_ms",
                "Broadcast run duration in milliseconds",
            )
            .buckets(vec![100.0, 500.0, 1000.0, 5000.0, 15000.0, 60000.0, 300000.0]),
        )
        .map_err(internal)?;

        registry.register(Box::new(updates_total.clone())).map_err(internal)?;
        registry.register(Box::new(update_errors_total.clone())).map_err(internal)?;
        registry.register(Box::new(messages_sent_total.clone())).map_err(internal)?;
        registry.register(Box::new(message_failures_total.clone())).map_err(internal)?;
        registry.register(Box::new(members_removed_total.clone())).map_err(internal)?;
        registry.register(Box::new(chats_removed_total.clone())).map_err(internal)?;
        registry.register(Box::new(broadcast_duration_ms.clone())).map_err(internal)?;

        Ok(Self {
            registry,
            updates_total,
            update_errors_total,
            messages_sent_total,
            message_failures_total,
            members_removed_total,
            chats_removed_total,
            broadcast_duration_ms,
        })
    }

    pub fn record_update(&self) {
        self.updates_total.inc();
    }

    pub fn record_update_error(&self, err: &BotError) {
        self.update_errors_total.inc();
        debug!("Recorded update error of kind {}", err.kind());
    }

    pub fn record_broadcast(&self, report: &BroadcastReport, duration_ms: u64) {
        self.messages_sent_total.inc_by(report.success_count as f64);
        self.message_failures_total.inc_by(report.error_count as f64);
        self.broadcast_duration_ms.observe(duration_ms as f64);
    }

    pub fn record_sync(&self, report: &SyncReport) {
        self.members_removed_total.inc_by(report.removed_count as f64);
    }

    pub fn record_refresh(&self, report: &RefreshReport) {
        self.chats_removed_total.inc_by(report.removed as f64);
    }

    pub fn updates_processed(&self) -> u64 {
        self.updates_total.get() as u64
    }

    pub fn get_prometheus_metrics(&self) -> Result<String, BotError> {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();

        encoder.encode(&metric_families, &mut buffer).map_err(internal)?;

        String::from_utf8(buffer).map_err(internal)
    }
}

fn counter(name: &str, help: &str) -> Result<Counter, BotError> {
    Counter::new(name, help).map_err(internal)
}

fn internal<E: std::fmt::Display>(e: E) -> BotError {
    BotError::InternalError {
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_counters_accumulate() {
        let metrics = MetricsService::new().unwrap();
        let report = BroadcastReport {
            broadcast_id: "b-1".to_string(),
            success_count: 4,
            error_count: 1,
            total_targets: 5,
        };
        metrics.record_broadcast(&report, 1200);
        metrics.record_broadcast(&report, 800);

        let text = metrics.get_prometheus_metrics().unwrap();
        assert!(text.contains("invite_bot_messages_sent_total 8"));
        assert!(text.contains("invite_bot_message_failures_total 2"));
        assert!(text.contains("invite_bot_broadcast_duration_ms_count 2"));
    }

    #[test]
    fn update_counter_is_readable() {
        let metrics = MetricsService::new().unwrap();
        metrics.record_update();
        metrics.record_update();
        metrics.record_update_error(&BotError::InvalidCallback {
            data: "nope".to_string(),
        });
        assert_eq!(metrics.updates_processed(), 2);
        let text = metrics.get_prometheus_metrics().unwrap();
        assert!(text.contains("invite_bot_update_errors_total 1"));
    }

    #[test]
    fn sync_and_refresh_removals_are_counted() {
        let metrics = MetricsService::new().unwrap();
        metrics.record_sync(&SyncReport {
            removed_count: 3,
            current_members: 10,
            db_members_before: 13,
        });
        metrics.record_refresh(&RefreshReport {
            chats_before: 4,
            chats_after: 3,
            removed: 1,
        });
        let text = metrics.get_prometheus_metrics().unwrap();
        assert!(text.contains("invite_bot_members_removed_total 3"));
        assert!(text.contains("invite_bot_chats_removed_total 1"));
    }
}
