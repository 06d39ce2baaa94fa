//! Local HTTP stand-ins for remote sources
//!
//! Each test builds an axum router, binds it to an ephemeral port and points
//! an adapter's base URL at it. Handlers bump a shared counter so tests can
//! assert exactly how many requests reached the "network".

use axum::Router;
use plantfill::adapters::HttpSettings;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared request counter
#[derive(Clone, Default)]
pub struct HitCounter(Arc<AtomicUsize>);

impl HitCounter {
    pub fn hit(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Serve `router` on 127.0.0.1 and return its base URL
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{}", addr)
}

/// Fast settings: short timeout, no throttle, no retries
pub fn test_settings() -> HttpSettings {
    HttpSettings {
        timeout: Duration::from_secs(5),
        max_retries: 0,
        rate_limit_delay: Duration::ZERO,
        user_agent: "plantfill-tests/0.0".to_string(),
    }
}
