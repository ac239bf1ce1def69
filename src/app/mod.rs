//! Trail dashboard app
//!
//! Owns the tracking session and the background workers, drains their
//! channels once per frame and lays out the panels.

mod chat;
mod diagnostics;
mod header;
mod settings;
mod status;
mod tracker;

use eframe::egui;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::DashboardConfig;
use crate::control::{ChatLog, ControlAck, ControlClient, ControlRequest};
use crate::core::{SensitivityConfig, TrackingSession, TrailBuffer, JITTER_THRESHOLD};
use crate::poll_state::PollState;
use crate::poller::{StatusPoller, Waker};
use crate::theme::{colors, dashboard_visuals};
use crate::time::now_seconds;

pub struct TrailApp {
    pub(crate) config: DashboardConfig,
    pub(crate) session: TrackingSession,
    /// Present only while tracking is active
    poller: Option<StatusPoller>,
    control: ControlClient,
    /// Repaint hook handed to every poller
    waker: Waker,
    pub(crate) chat: ChatLog,
    pub(crate) chat_input: String,
    /// Slider values, sent on Apply
    pub(crate) sensitivity_draft: SensitivityConfig,
    /// Draft seeded from the backend once
    sensitivity_synced: bool,
    pub(crate) show_settings: bool,
    pub(crate) fps_counter: header::FpsCounter,
    pub(crate) frame_cache: Option<tracker::FrameCache>,
    diag_last_tick: f64,
}

impl TrailApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        cc.egui_ctx.set_visuals(dashboard_visuals());

        let ctx = cc.egui_ctx.clone();
        let waker: Waker = Arc::new(move || ctx.request_repaint());

        info!(url = %config.api_base_url, "Dashboard created");

        Self {
            session: TrackingSession::new(TrailBuffer::with_limits(
                config.trail_length,
                JITTER_THRESHOLD,
            )),
            poller: None,
            control: ControlClient::spawn(&config),
            waker,
            chat: ChatLog::new(),
            chat_input: String::new(),
            sensitivity_draft: SensitivityConfig::default(),
            sensitivity_synced: false,
            show_settings: false,
            fps_counter: header::FpsCounter::new(),
            frame_cache: None,
            diag_last_tick: 0.0,
            config,
        }
    }

    pub(crate) fn start_tracking(&mut self) {
        let epoch = self.session.start(now_seconds());
        let running = self.poller.as_ref().is_some_and(|p| p.epoch() == epoch);
        if !running {
            self.poller = Some(StatusPoller::spawn_with_waker(
                &self.config,
                epoch,
                Some(self.waker.clone()),
            ));
        }
    }

    pub(crate) fn stop_tracking(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        self.session.stop();
    }

    pub(crate) fn toggle_tracking(&mut self) {
        if self.session.is_active() {
            self.stop_tracking();
        } else {
            self.start_tracking();
        }
    }

    pub(crate) fn poll_state(&self) -> PollState {
        self.poller
            .as_ref()
            .map(|p| p.state())
            .unwrap_or_default()
    }

    pub(crate) fn send_control(&mut self, request: ControlRequest) {
        self.control.send(request);
    }

    /// Apply queued poll results and control replies
    fn process_messages(&mut self) {
        // Yield after ~12ms; leftovers stay queued for the next frame
        use std::time::{Duration, Instant};
        const BUDGET: Duration = Duration::from_millis(12);
        let deadline = Instant::now() + BUDGET;

        if let Some(poller) = &self.poller {
            while let Ok(msg) = poller.rx.try_recv() {
                self.session.apply(msg, now_seconds());
                if Instant::now() >= deadline {
                    break;
                }
            }
        }

        while let Ok(reply) = self.control.rx.try_recv() {
            if let Ok(ControlAck::SensitivityApplied(cfg)) = &reply.result {
                self.sensitivity_draft = *cfg;
            }
            if let Err(e) = &reply.result {
                warn!(request = ?reply.request, error = %e, "Control request failed");
            }
            self.chat.apply_reply(&reply);
        }

        if !self.sensitivity_synced {
            if let Some(cfg) = self.session.sensitivity() {
                self.sensitivity_draft = cfg;
                self.sensitivity_synced = true;
            }
        }
    }

    fn diagnostics_tick(&mut self, now: f64) {
        if now - self.diag_last_tick < 1.0 {
            return;
        }
        self.diag_last_tick = now;
        if !self.session.is_active() {
            return;
        }
        let stats = self.session.stats();
        info!(
            rate_hz = self.session.observed_rate(),
            trail_len = self.session.trail().len(),
            polls_ok = stats.polls_ok,
            polls_failed = stats.polls_failed,
            stale = stats.stale_discarded,
            "stats"
        );
    }
}

impl eframe::App for TrailApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_messages();

        let now = now_seconds();
        self.diagnostics_tick(now);

        // Keeps fps and the rate readout moving when no sample arrives
        if self.session.is_active() {
            ctx.request_repaint_after(self.config.poll_interval);
        }

        egui::TopBottomPanel::top("header")
            .frame(egui::Frame::new().fill(colors::BG_PRIMARY).inner_margin(4.0))
            .show(ctx, |ui| {
                self.render_header(ui);
            });

        // Side panels must be shown before the CentralPanel
        if self.show_settings {
            self.render_settings(ctx);
        }
        self.render_chat(ctx);

        self.draw_diagnostics(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(colors::BG_PRIMARY).inner_margin(8.0))
            .show(ctx, |ui| {
                self.render_tracker(ui);
                ui.add_space(8.0);
                self.render_status(ui);
            });
    }
}
