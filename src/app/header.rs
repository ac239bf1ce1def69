//! Header bar: start/stop, settings toggle and live status

use eframe::egui;
use crate::poll_state::PollState;
use crate::theme::colors;
use crate::time::now_seconds;
use super::TrailApp;

pub(crate) fn state_color(state: &PollState) -> egui::Color32 {
    match state {
        PollState::Idle => colors::TEXT_MUTED,
        PollState::Waiting => colors::WARN,
        PollState::Online => colors::OK,
        PollState::Degraded(_) => colors::ERROR,
    }
}

impl TrailApp {
    pub(crate) fn render_header(&mut self, ui: &mut egui::Ui) {
        self.fps_counter.tick();

        let state = self.poll_state();
        let active = self.session.is_active();

        ui.horizontal(|ui| {
            let (label, color) = if active {
                ("Stop Detection", colors::ERROR)
            } else {
                ("Start Detection", colors::ACCENT)
            };
            if ui.button(egui::RichText::new(label).color(color)).clicked() {
                self.toggle_tracking();
            }

            ui.add_space(10.0);

            let settings_text = if self.show_settings { "Settings <<<" } else { "Settings >>>" };
            if ui.button(egui::RichText::new(settings_text)).clicked() {
                self.show_settings = !self.show_settings;
            }

            // Right side, right-to-left order
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(egui::RichText::new("Trailscope").color(colors::ACCENT));
                ui.add_space(10.0);

                ui.label(
                    egui::RichText::new(format!("{} Hz", self.session.observed_rate()))
                        .color(colors::TEXT_MUTED),
                );
                ui.label(egui::RichText::new("/").color(colors::TEXT_MUTED));

                ui.label(
                    egui::RichText::new(format!("{:.0} fps", self.fps_counter.fps()))
                        .color(colors::TEXT_SECONDARY),
                );

                ui.add_space(10.0);

                let response = ui.colored_label(state_color(&state), state.label());
                if let PollState::Degraded(reason) = &state {
                    response.on_hover_text(reason.as_str());
                }
            });
        });
    }
}

/// Frame rate over the last 60 frames
pub struct FpsCounter {
    frames: Vec<f64>,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            frames: Vec::with_capacity(60),
        }
    }

    pub fn tick(&mut self) {
        self.record(now_seconds());
    }

    fn record(&mut self, now: f64) {
        self.frames.push(now);
        if self.frames.len() > 60 {
            self.frames.remove(0);
        }
    }

    pub fn fps(&self) -> f64 {
        let (Some(first), Some(last)) = (self.frames.first(), self.frames.last()) else {
            return 0.0;
        };
        let elapsed = last - first;
        if self.frames.len() < 2 || elapsed <= 0.0 {
            return 0.0;
        }
        (self.frames.len() as f64 - 1.0) / elapsed
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}
