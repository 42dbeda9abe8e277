//! Fixed-window request limiter keyed by client IP.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use octodock_core::config::RateLimitConfig;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Counts requests per IP inside a window that starts at the client's
/// first request and restarts once it has elapsed.
#[derive(Clone)]
pub struct RateLimiter {
    window: Duration,
    max: u32,
    message: Arc<str>,
    clients: Arc<Mutex<HashMap<IpAddr, Window>>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            window: Duration::from_millis(config.window_ms),
            max: config.max,
            message: Arc::from(config.message.as_str()),
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Count one request from `ip`. Returns whether it is allowed.
    pub async fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;
        let entry = clients.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }
        entry.count = entry.count.saturating_add(1);
        entry.count <= self.max
    }

    /// Drop windows that have elapsed. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;
        let before = clients.len();
        clients.retain(|_, w| now.duration_since(w.started) < self.window);
        before - clients.len()
    }

    pub async fn tracked_clients(&self) -> usize {
        self.clients.lock().await.len()
    }

    /// Run [`sweep`](Self::sweep) once per window until `shutdown` fires.
    pub fn spawn_sweeper(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let period = limiter.window.max(Duration::from_millis(1));
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => return,
                    _ = ticker.tick() => {
                        let removed = limiter.sweep().await;
                        if removed > 0 {
                            debug!(removed, "Swept rate limit windows");
                        }
                    }
                }
            }
        })
    }
}

/// Socket peer address, else the first `X-Forwarded-For` entry.
fn client_ip(request: &Request) -> Option<IpAddr> {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return Some(addr.ip());
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse().ok())
}

/// Middleware rejecting clients over their budget with 429.
///
/// Requests whose IP cannot be determined are let through.
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(ip) = client_ip(&request) {
        if !limiter.check(ip).await {
            warn!(client = %ip, "Rate limit exceeded");
            return (StatusCode::TOO_MANY_REQUESTS, limiter.message.to_string()).into_response();
        }
    }
    next.run(request).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn limiter(window_ms: u64, max: u32) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            window_ms,
            max,
            ..RateLimitConfig::default()
        })
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_past_max_within_window() {
        let limiter = limiter(1000, 3);
        let client = ip("10.0.0.1");
        for _ in 0..3 {
            assert!(limiter.check(client).await);
        }
        assert!(!limiter.check(client).await);
        assert!(!limiter.check(client).await);
    }

    #[tokio::test(start_paused = true)]
    async fn window_restarts_after_elapsing() {
        let limiter = limiter(1000, 1);
        let client = ip("10.0.0.1");
        assert!(limiter.check(client).await);
        assert!(!limiter.check(client).await);

        tokio::time::advance(Duration::from_millis(1000)).await;
        assert!(limiter.check(client).await);
        assert!(!limiter.check(client).await);
    }

    #[tokio::test(start_paused = true)]
    async fn clients_are_counted_separately() {
        let limiter = limiter(1000, 1);
        assert!(limiter.check(ip("10.0.0.1")).await);
        assert!(limiter.check(ip("10.0.0.2")).await);
        assert!(!limiter.check(ip("10.0.0.1")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_drops_only_elapsed_windows() {
        let limiter = limiter(1000, 5);
        limiter.check(ip("10.0.0.1")).await;
        tokio::time::advance(Duration::from_millis(600)).await;
        limiter.check(ip("10.0.0.2")).await;
        tokio::time::advance(Duration::from_millis(500)).await;

        assert_eq!(limiter.sweep().await, 1);
        assert_eq!(limiter.tracked_clients().await, 1);
    }

    #[test]
    fn forwarded_for_uses_first_entry() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(client_ip(&request), Some(ip("203.0.113.7")));

        let bare = Request::builder().body(axum::body::Body::empty()).unwrap();
        assert_eq!(client_ip(&bare), None);
    }
}
