//! Background `/status` poller
//!
//! Runs a single-threaded tokio runtime on its own thread and passes results
//! back through a channel. Each tick spawns one fetch, so a slow response
//! never holds up the schedule; every fetch carries the session epoch and a
//! sequence number so the consumer can drop late or stale answers.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace};

use crate::config::DashboardConfig;
use crate::core::{PollMessage, StatusReport};
use crate::error::FetchError;
use crate::poll_state::PollState;

/// Called from the poller thread after each delivered message
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Repeating status poller bound to one tracking session
pub struct StatusPoller {
    /// Poll results, in arrival order
    pub rx: Receiver<PollMessage>,
    /// Shared connection state
    pub state: Arc<Mutex<PollState>>,
    shutdown: watch::Sender<bool>,
    epoch: u64,
}

impl StatusPoller {
    /// Start polling `config.status_url()` every `config.poll_interval`
    pub fn spawn(config: &DashboardConfig, epoch: u64) -> Self {
        Self::spawn_with_waker(config, epoch, None)
    }

    /// Like `spawn`, invoking `waker` whenever a message is queued
    pub fn spawn_with_waker(config: &DashboardConfig, epoch: u64, waker: Option<Waker>) -> Self {
        let (tx, rx) = mpsc::channel();
        let state = Arc::new(Mutex::new(PollState::Waiting));
        let (shutdown, shutdown_rx) = watch::channel(false);

        let job = PollLoop {
            url: config.status_url(),
            interval: config.poll_interval,
            timeout: config.request_timeout,
            epoch,
            tx,
            state: state.clone(),
            state_seq: Arc::new(AtomicU64::new(0)),
            waker,
        };

        let thread_state = state.clone();
        let spawned = std::thread::Builder::new()
            .name("status-poller".into())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!(error = %e, "Failed to create tokio runtime");
                        *thread_state.lock() = PollState::Degraded(e.to_string());
                        return;
                    }
                };
                rt.block_on(job.run(shutdown_rx));
            });

        if let Err(e) = spawned {
            error!(error = %e, "Failed to spawn poller thread");
            *state.lock() = PollState::Degraded(e.to_string());
        }

        Self {
            rx,
            state,
            shutdown,
            epoch,
        }
    }

    /// Cancel the timer and every fetch still in flight
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn state(&self) -> PollState {
        self.state.lock().clone()
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

struct PollLoop {
    url: String,
    interval: Duration,
    timeout: Duration,
    epoch: u64,
    tx: Sender<PollMessage>,
    state: Arc<Mutex<PollState>>,
    /// Sequence number behind the current `state`
    state_seq: Arc<AtomicU64>,
    waker: Option<Waker>,
}

impl PollLoop {
    async fn run(self, shutdown: watch::Receiver<bool>) {
        let client = match reqwest::Client::builder().timeout(self.timeout).build() {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "Failed to build HTTP client");
                *self.state.lock() = PollState::Degraded(e.to_string());
                return;
            }
        };

        info!(
            url = %self.url,
            interval_ms = self.interval.as_millis() as u64,
            epoch = self.epoch,
            "Status polling started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut seq = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = cancelled(shutdown.clone()) => break,
                _ = ticker.tick() => {
                    seq += 1;
                    let fetch = Fetch {
                        client: client.clone(),
                        url: self.url.clone(),
                        epoch: self.epoch,
                        seq,
                        tx: self.tx.clone(),
                        state: self.state.clone(),
                        state_seq: self.state_seq.clone(),
                        waker: self.waker.clone(),
                    };
                    let cancel = shutdown.clone();
                    tokio::spawn(async move {
                        let result = tokio::select! {
                            biased;
                            _ = cancelled(cancel) => None,
                            result = fetch_status(&fetch.client, &fetch.url) => Some(result),
                        };
                        match result {
                            Some(result) => fetch.deliver(result),
                            None => trace!(seq = fetch.seq, "Fetch cancelled"),
                        }
                    });
                }
            }
        }

        info!(epoch = self.epoch, polls = seq, "Status polling stopped");
    }
}

/// One in-flight request and everything needed to report its result
struct Fetch {
    client: reqwest::Client,
    url: String,
    epoch: u64,
    seq: u64,
    tx: Sender<PollMessage>,
    state: Arc<Mutex<PollState>>,
    state_seq: Arc<AtomicU64>,
    waker: Option<Waker>,
}

impl Fetch {
    fn deliver(self, result: Result<StatusReport, FetchError>) {
        let next = match &result {
            Ok(_) => PollState::Online,
            Err(e) => {
                debug!(seq = self.seq, error = %e, "Status fetch failed");
                PollState::Degraded(e.to_string())
            }
        };
        update_state(&self.state, &self.state_seq, self.seq, next);

        let msg = PollMessage {
            epoch: self.epoch,
            seq: self.seq,
            result,
        };
        if self.tx.send(msg).is_err() {
            // Receiver dropped, session is gone
            trace!(seq = self.seq, "Poll result dropped");
            return;
        }
        if let Some(waker) = &self.waker {
            waker();
        }
    }
}

/// Publish `next` unless a newer fetch already did. Returns whether it was applied.
fn update_state(state: &Mutex<PollState>, state_seq: &AtomicU64, seq: u64, next: PollState) -> bool {
    let mut state = state.lock();
    if state_seq.load(Ordering::Acquire) >= seq {
        trace!(seq, "Out-of-order fetch, connection state kept");
        return false;
    }
    state_seq.store(seq, Ordering::Release);
    *state = next;
    true
}

/// Resolves once shutdown is requested or the poller handle is dropped
async fn cancelled(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// Issue one `GET /status` and decode the body
pub async fn fetch_status(client: &reqwest::Client, url: &str) -> Result<StatusReport, FetchError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }
    let body = response.bytes().await?;
    let report = serde_json::from_slice(&body)?;
    Ok(report)
}
