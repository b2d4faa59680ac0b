//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, MethodRouter};
use items_api::config::{ListenerConfig, TimeoutConfig};
use items_api::lifecycle::{
    Coordinator, GracePeriod, ServiceState, ShutdownReport, SignalTrigger, SignalWatcher,
};
use items_api::{HandlerSet, HttpListener};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// A coordinator running a real listener on a loopback port.
pub struct RunningService {
    pub addr: SocketAddr,
    pub trigger: SignalTrigger,
    pub run: JoinHandle<ShutdownReport>,
}

impl RunningService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

fn coordinator(
    bind_address: &str,
    handlers: HandlerSet,
    grace_period: Duration,
) -> Coordinator<HttpListener> {
    let config = ListenerConfig {
        bind_address: bind_address.to_string(),
    };
    let timeouts = TimeoutConfig {
        grace_period_ms: grace_period.as_millis() as u64,
        ..TimeoutConfig::default()
    };
    let listener = Arc::new(HttpListener::new(&config, handlers, &timeouts));

    Coordinator::new(listener, GracePeriod::new(grace_period))
        .with_force_close_timeout(timeouts.force_close_timeout())
}

/// Start the service on an ephemeral port and wait until it is running.
pub async fn start(handlers: HandlerSet, grace_period: Duration) -> RunningService {
    let coordinator = coordinator("127.0.0.1:0", handlers, grace_period);
    let mut status = coordinator.status();
    let (trigger, watcher) = SignalWatcher::channel();
    let run = tokio::spawn(coordinator.run(watcher));

    let addr = tokio::time::timeout(Duration::from_secs(2), async {
        status
            .wait_for(|s| s.state == ServiceState::Running)
            .await
            .map(|s| s.local_addr)
    })
    .await
    .expect("service should start")
    .expect("coordinator should publish status")
    .expect("running service has an address");

    RunningService { addr, trigger, run }
}

/// Run the service against an address that is expected not to bind.
#[allow(dead_code)]
pub async fn run_unbindable(bind_address: &str) -> ShutdownReport {
    let coordinator = coordinator(bind_address, HandlerSet::new(), Duration::from_millis(100));
    let (_trigger, watcher) = SignalWatcher::channel();
    coordinator.run(watcher).await
}

/// A route that signals `entered`, sleeps for `delay`, then answers "slept".
#[allow(dead_code)]
pub fn sleeping_route(delay: Duration, entered: Arc<Notify>) -> MethodRouter {
    get(move || {
        let entered = Arc::clone(&entered);
        async move {
            entered.notify_one();
            tokio::time::sleep(delay).await;
            "slept"
        }
    })
}

/// A client that does not reuse connections between requests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
