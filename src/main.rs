//! Pagesmith realtime simulator.
//!
//! Connects the simulated realtime link, keeps a live preview in sync with
//! remote edits and logs an analytics summary until interrupted.

use std::sync::Arc;

use tokio::time::{self, MissedTickBehavior};

use pagesmith::adapters::{FileStore, InMemoryEventBus, SystemClock, TokioFrameScheduler};
use pagesmith::application::{
    CollaborationTracker, LivePreviewConfig, LivePreviewSynchronizer, RealtimeConfig,
    RealtimeService, RemoteEditBridge, TrafficSimulator, TrafficSimulatorConfig,
};
use pagesmith::config::{AppConfig, LoggingConfig};
use pagesmith::domain::events::ConnectionState;
use pagesmith::ports::{Clock, EventSubscriber};

fn init_tracing(logging: &LoggingConfig) {
    let builder = tracing_subscriber::fmt().with_env_filter(logging.env_filter());
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.logging);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let bus = Arc::new(InMemoryEventBus::new());

    let traffic = Arc::new(TrafficSimulator::with_config(
        bus.clone(),
        clock.clone(),
        TrafficSimulatorConfig::from_settings(&config.simulation, config.analytics.log_capacity),
    ));
    let realtime = RealtimeService::new(
        bus.clone(),
        traffic,
        RealtimeConfig::from_settings(&config.simulation),
    );

    let preview = LivePreviewSynchronizer::with_config(
        Arc::new(TokioFrameScheduler::current(config.preview.frame_interval())?),
        clock.clone(),
        Arc::new(FileStore::new(&config.preview.storage_dir)),
        LivePreviewConfig::from_settings(&config.preview),
    );
    preview.restore().await;

    let collaboration = CollaborationTracker::new_shared(clock, config.analytics.cursor_ttl());
    let mut subscriptions = collaboration.register(bus.as_ref());
    subscriptions.push(RemoteEditBridge::new_shared(preview.clone()).register(bus.as_ref()));

    if realtime.connect().await != ConnectionState::Connected {
        tracing::warn!("starting without a realtime connection");
    }
    preview.toggle_live();

    let mut report = time::interval(config.analytics.report_interval());
    report.set_missed_tick_behavior(MissedTickBehavior::Delay);
    report.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = report.tick() => {
                let summary = realtime.summary(config.analytics.window());
                let metrics = realtime.metrics();
                tracing::info!(
                    state = %realtime.connection_state(),
                    total_calls = summary.total_calls,
                    success_rate = summary.success_rate,
                    average_response_time = summary.average_response_time,
                    errors = summary.error_count,
                    smoothed_response_time = metrics.response_time,
                    active_users = collaboration.active_users(),
                    preview_frame = preview.frame(),
                    "analytics summary"
                );
            }
        }
    }

    tracing::info!("shutting down");
    realtime.disconnect();
    if preview.is_live() {
        if let Err(e) = preview.persist_now().await {
            tracing::warn!(error = %e, "failed to persist live preview on shutdown");
        }
    }
    for subscription in &subscriptions {
        bus.unsubscribe(subscription);
    }

    Ok(())
}
