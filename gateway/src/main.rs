use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::info;

use common::clock::{Clock, SystemClock};
use common::logger::init_tracing;
use offers::{
    AdmissionFilter, LaunchRateLimiter, Manager, ManagerConfig, MatchedTasks, MatcherHandle, Offer,
    OfferMatcher, Resource, TaskPlacement, TaskSource,
};

mod config;

use config::GatewayConfig;

/// A placement whose only reachable outcome in this demo is "rejected and
/// logged" — there is no real executor here to commit it.
#[derive(Debug)]
struct LoggedSource {
    task_id: String,
}

impl TaskSource for LoggedSource {
    fn reject(self: Box<Self>) {
        info!(task_id = %self.task_id, "placement rejected");
    }
}

/// Proposes one task per call as long as the offer still has CPU for it,
/// standing in for a real per-application scheduler.
struct DemoMatcher {
    name: &'static str,
    cpu_per_task: f64,
    max_tasks: usize,
}

#[async_trait]
impl OfferMatcher for DemoMatcher {
    async fn process_offer(&self, _deadline: Instant, offer: Offer) -> anyhow::Result<MatchedTasks> {
        let available = offer
            .resources
            .iter()
            .find_map(|r| match &r.value {
                offers::ResourceValue::Scalar(v) if r.name == "cpus" => Some(*v),
                _ => None,
            })
            .unwrap_or(0.0);

        let affordable = (available / self.cpu_per_task).floor() as usize;
        let count = affordable.min(self.max_tasks);

        let placements = (0..count)
            .map(|i| {
                let task_id = format!("{}-{i}", self.name);
                TaskPlacement {
                    resources: vec![Resource::scalar("cpus", "*", self.cpu_per_task)],
                    source: Box::new(LoggedSource { task_id: task_id.clone() }),
                    task_id,
                }
            })
            .collect();

        Ok(MatchedTasks {
            offer_id: offer.id,
            placements,
        })
    }
}

async fn run_matching_demo(clock: Arc<dyn Clock>, config: &GatewayConfig) -> anyhow::Result<()> {
    let manager = Manager::spawn(
        ManagerConfig {
            max_tasks_per_offer: config.max_tasks_per_offer,
        },
        clock.clone(),
    );
    manager.set_launch_tokens(config.initial_launch_tokens).await;

    manager
        .add_or_update_matcher(MatcherHandle::new(
            "payments",
            Arc::new(DemoMatcher {
                name: "payments",
                cpu_per_task: 0.5,
                max_tasks: 4,
            }),
        ))
        .await?;
    manager
        .add_or_update_matcher(MatcherHandle::new(
            "batch",
            Arc::new(DemoMatcher {
                name: "batch",
                cpu_per_task: 1.0,
                max_tasks: 8,
            }),
        ))
        .await?;

    let offer = Offer::new(vec![Resource::scalar("cpus", "*", 8.0)]);
    let deadline = clock.now() + Duration::from_millis(config.offer_deadline_ms);

    let result = manager.match_offer(deadline, offer).await?;
    info!(accepted = result.placements.len(), "offer round finished");

    let rate_limiter = LaunchRateLimiter::new(clock);
    let app = offers::RateLimitedApp {
        id: "payments".to_string(),
        version: "v1".to_string(),
        backoff: Duration::from_secs(1),
        backoff_factor: 2.0,
        max_launch_delay: Duration::from_secs(30),
    };
    let deadline = rate_limiter.add_delay(&app);
    info!(?deadline, "launch backoff extended for demo app");

    Ok(())
}

async fn run_admission_demo(config: &GatewayConfig) {
    let filter = Arc::new(AdmissionFilter::new(
        config.concurrent_requests,
        Duration::from_millis(config.admission_wait_ms),
    ));

    let mut calls = Vec::new();
    for i in 0..config.concurrent_requests + 4 {
        let filter = filter.clone();
        calls.push(tokio::spawn(async move {
            filter
                .admit::<_, (), anyhow::Error>(async {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok(())
                })
                .await
                .map_err(|e| e.to_string())
                .map(|_| i)
        }));
    }

    let mut accepted = 0usize;
    let mut rejected = 0usize;
    for call in calls {
        match call.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(_) => rejected += 1,
        }
    }
    info!(accepted, rejected, "admission filter demo finished");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env();
    init_tracing(config.log_json);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    run_matching_demo(clock, &config).await?;
    run_admission_demo(&config).await;

    Ok(())
}
