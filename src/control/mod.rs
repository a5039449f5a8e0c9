pub mod web;
pub mod phase;
pub mod scene;
pub mod fn_queue;
pub mod scheduler;

use crate::config::Config;
use crate::util::clock::ClockTime;
use crate::util::hue_api::HueBridge;
use phase::{LightOutput, Phase};
use scheduler::{ClockSource, Scheduler, TimeSource};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// latest tick, as shown by `GET /state`
#[derive(
    Debug, Clone, PartialEq,
    serde::Serialize, // to axum::Json
    utoipa::ToSchema  // to display in swagger-ui
)]
pub struct Status {
    pub phase: Phase,
    /// time of day the output was computed for
    #[schema(value_type = String, example = "21:45:00")]
    pub clock_time: ClockTime,
    /// missing before the first tick or if the tick failed
    pub output: Option<LightOutput>,
    pub error: Option<String>,
}

impl Status {
    pub const fn pending(phase: Phase, clock_time: ClockTime) -> Self {
        Self { phase, clock_time, output: None, error: None }
    }
}

/// apply queued overrides, then advance the scheduler to the current time
pub async fn evaluate<T: TimeSource>(
    scheduler: &mut Scheduler,
    clock: &ClockSource<T>,
    queue: &fn_queue::Queue,
) -> Status {
    let applied = queue.apply_all(scheduler).await;
    if applied > 0 {
        tracing::debug!("applied {applied} override(s)");
    }

    let now = clock.now();
    match scheduler.tick(now) {
        Ok(output) => {
            tracing::debug!(
                "{now} {}: brightness {:.3}, coolness {:.3}",
                scheduler.phase(), output.brightness, output.coolness
            );
            Status { output: Some(output), ..Status::pending(scheduler.phase(), now) }
        }
        Err(error) => {
            // retried on the next tick
            tracing::error!("{now}: {error}");
            Status { error: Some(error.to_string()), ..Status::pending(scheduler.phase(), now) }
        }
    }
}

/// set up scheduler, bridge and web server, then tick forever.
/// only returns if setting up failed.
pub async fn main_loop(config: Config) -> anyhow::Result<()> {
    let clock = ClockSource::new(scheduler::SystemTimeSource, config.schedule.timezone);
    let bridge = HueBridge::new(&config.bridge)?;

    let now = clock.now();
    let mut scheduler = Scheduler::new(config.schedule, now);

    // overrides from the web server, applied at the start of the next tick
    let queue = fn_queue::Queue::new();
    let (status_sender, status_receiver) = watch::channel(Status::pending(scheduler.phase(), now));

    // bind before spawning so a taken port fails startup
    let address = std::net::SocketAddr::new(config.server.address, config.server.port);
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!("starting server on http://{address} ...");

    // "fire and forget" web server start
    let state = web::AppState::new(queue.clone(), status_receiver, &config.bridge.username);
    tokio::spawn(async move {
        if let Err(error) = web::serve(listener, state).await {
            tracing::error!("web server stopped: {error}");
        }
    });

    if cfg!(feature = "hue_debug") {
        tracing::info!("hue_debug is enabled: not sending PUT requests to the hue bridge");
    }

    let mut interval = tokio::time::interval(config.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // actual main loop
    loop {
        // overrides don't wait for the next interval
        tokio::select! {
            _ = interval.tick() => {}
            () = queue.notified() => {}
        }

        let status = evaluate(&mut scheduler, &clock, &queue).await;
        let output = status.output;
        status_sender.send_replace(status);

        if let Some(output) = output {
            match bridge.apply_output(output).await {
                Ok(report) if report.failed > 0 => {
                    tracing::warn!("{} of {} lights failed to update", report.failed, report.failed + report.updated);
                }
                Ok(_) => {}
                Err(error) => tracing::warn!("could not reach hue bridge: {error}"),
            }
        }
    }
}
