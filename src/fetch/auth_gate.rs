//! Single-flight authentication gate
//!
//! Hosts protected by client certificates or integrated login need one
//! side-effecting handshake before the first real request. The gate runs at
//! most one such probe at a time and holds every request issued meanwhile in
//! a FIFO queue, releasing it in arrival order once the probe finishes,
//! fails or times out.
//!
//! ```text
//!   Idle ──(first request to an https origin, or force_auth)──▶ ProbeInFlight
//!    ▲                                                               │
//!    └──────────(probe done / failed / timed out, queue drained)─────┘
//! ```

use crate::fetch::{FetchError, FetchRequest, RawFetcher};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;

/// Opaque authentication handshake against a URL
///
/// Implementations are best effort; the outcome is not reported back and
/// requests proceed either way.
#[async_trait]
pub trait AuthProbe: Send + Sync {
    async fn authenticate(&self, url: &str);
}

/// Probe that performs a plain GET against the target
///
/// With a client configured for certificate or negotiate authentication,
/// this completes the handshake once so later requests reuse the session.
#[derive(Debug, Clone)]
pub struct HttpAuthProbe {
    client: Client,
}

impl HttpAuthProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthProbe for HttpAuthProbe {
    async fn authenticate(&self, url: &str) {
        match self.client.get(url).send().await {
            Ok(response) => {
                tracing::debug!("Auth probe for {} returned {}", url, response.status())
            }
            Err(e) => tracing::debug!("Auth probe for {} failed: {}", url, e),
        }
    }
}

/// Observable state of the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    Idle,
    ProbeInFlight,
}

#[derive(Debug)]
struct GateState {
    phase: GatePhase,
    waiting: VecDeque<oneshot::Sender<()>>,
    authenticated: HashSet<String>,
}

enum Admission {
    Dispatch,
    Wait(oneshot::Receiver<()>),
    Probe(String),
}

/// [`RawFetcher`] wrapper that serializes authentication probes
pub struct AuthGate<F> {
    inner: F,
    probe: Arc<dyn AuthProbe>,
    probe_timeout: Duration,
    state: Mutex<GateState>,
}

impl<F: RawFetcher> AuthGate<F> {
    /// Creates a gate around `inner`
    ///
    /// # Arguments
    ///
    /// * `inner` - The fetcher requests are dispatched to
    /// * `probe` - The handshake run once per https origin
    /// * `probe_timeout` - Upper bound on how long a probe holds the queue
    pub fn new(inner: F, probe: Arc<dyn AuthProbe>, probe_timeout: Duration) -> Self {
        Self {
            inner,
            probe,
            probe_timeout,
            state: Mutex::new(GateState {
                phase: GatePhase::Idle,
                waiting: VecDeque::new(),
                authenticated: HashSet::new(),
            }),
        }
    }

    pub fn phase(&self) -> GatePhase {
        self.lock().phase
    }

    /// Number of requests waiting for the current probe
    pub fn queued(&self) -> usize {
        self.lock().waiting.len()
    }

    /// Returns true if the origin of `url` already went through a probe
    pub fn is_authenticated(&self, url: &str) -> bool {
        crate::url::origin_of(url).is_some_and(|origin| self.lock().authenticated.contains(&origin))
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn admit(&self, url: &str, force_auth: bool) -> Admission {
        let mut state = self.lock();

        if state.phase == GatePhase::ProbeInFlight {
            let (tx, rx) = oneshot::channel();
            state.waiting.push_back(tx);
            tracing::trace!("Queued {} behind auth probe ({} waiting)", url, state.waiting.len());
            return Admission::Wait(rx);
        }

        let origin = match crate::url::origin_of(url) {
            Some(origin) if origin.starts_with("https://") => origin,
            _ => return Admission::Dispatch,
        };

        if force_auth || !state.authenticated.contains(&origin) {
            state.phase = GatePhase::ProbeInFlight;
            tracing::trace!("Gate Idle -> ProbeInFlight for {}", origin);
            Admission::Probe(origin)
        } else {
            Admission::Dispatch
        }
    }

    async fn run_probe(&self, origin: String, url: &str) {
        // Releases the queue even if this future is dropped mid-probe
        let _release = ProbeRelease {
            state: &self.state,
            origin,
        };

        if tokio::time::timeout(self.probe_timeout, self.probe.authenticate(url))
            .await
            .is_err()
        {
            tracing::warn!(
                "Auth probe for {} timed out after {:?}",
                url,
                self.probe_timeout
            );
        }
    }
}

struct ProbeRelease<'a> {
    state: &'a Mutex<GateState>,
    origin: String,
}

impl Drop for ProbeRelease<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.authenticated.insert(std::mem::take(&mut self.origin));
        state.phase = GatePhase::Idle;

        let waiting = state.waiting.len();
        for waiter in state.waiting.drain(..) {
            // A dropped receiver means the request was abandoned
            let _ = waiter.send(());
        }
        tracing::trace!("Gate ProbeInFlight -> Idle, released {} requests", waiting);
    }
}

#[async_trait]
impl<F: RawFetcher> RawFetcher for AuthGate<F> {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        match self.admit(&request.url, request.force_auth) {
            Admission::Dispatch => {}
            // Released requests dispatch directly, without a second admission
            Admission::Wait(released) => {
                tokio::select! {
                    _ = request.cancel.cancelled() => return Err(FetchError::Cancelled),
                    _ = released => {}
                }
            }
            Admission::Probe(origin) => {
                tracing::debug!("Running auth probe for {}", origin);
                self.run_probe(origin, &request.url).await;
            }
        }

        if request.cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        self.inner.fetch(request).await
    }
}
