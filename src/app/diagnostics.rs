//! Diagnostics overlay: poll counters and rate history

use eframe::egui;
use crate::core::SessionStats;
use crate::theme::colors;
use super::header::state_color;
use super::TrailApp;

/// Compact count (1234 -> "1234", 12345 -> "12.3k")
fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 10_000 {
        format!("{:.1}k", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

fn acceptance_text(stats: &SessionStats) -> String {
    let total = stats.samples_accepted + stats.samples_rejected;
    if total == 0 {
        return "no samples".to_string();
    }
    format!(
        "{} kept / {} jitter",
        format_count(stats.samples_accepted),
        format_count(stats.samples_rejected)
    )
}

impl TrailApp {
    pub(crate) fn draw_diagnostics(&self, ctx: &egui::Context) {
        use egui_plot::{Line, Plot, PlotPoints};

        let state = self.poll_state();
        let stats = self.session.stats();

        let title = egui::RichText::new(format!("● {}", state.label())).color(state_color(&state));

        egui::Area::new(egui::Id::new("diagnostics_area"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-316.0, -8.0))
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(20, 20, 20, 200))
                    .corner_radius(4.0)
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        ui.set_min_width(240.0);
                        egui::CollapsingHeader::new(title)
                            .default_open(false)
                            .show(ui, |ui| {
                                ui.label(
                                    egui::RichText::new(format!(
                                        "{} ok / {} failed polls",
                                        format_count(stats.polls_ok),
                                        format_count(stats.polls_failed),
                                    ))
                                    .color(colors::TEXT_SECONDARY),
                                );
                                ui.label(
                                    egui::RichText::new(acceptance_text(&stats))
                                        .color(colors::TEXT_MUTED),
                                );

                                let anomalies = stats.stale_discarded + stats.malformed;
                                let color = if anomalies > 0 { colors::ERROR } else { colors::TEXT_MUTED };
                                ui.label(
                                    egui::RichText::new(format!(
                                        "{} stale / {} malformed",
                                        format_count(stats.stale_discarded),
                                        format_count(stats.malformed),
                                    ))
                                    .color(color),
                                );

                                if let Some(err) = self.session.last_error() {
                                    ui.label(
                                        egui::RichText::new(err).color(colors::ERROR).small(),
                                    );
                                }

                                ui.add_space(4.0);
                                ui.label(egui::RichText::new("Sampling rate (Hz)").color(colors::TEXT_MUTED));

                                let points: PlotPoints = self
                                    .session
                                    .rate_history()
                                    .iter()
                                    .enumerate()
                                    .map(|(x, &hz)| [x as f64, hz as f64])
                                    .collect();
                                let nominal =
                                    1.0 / self.config.poll_interval.as_secs_f64().max(1e-3);

                                Plot::new("rate_history")
                                    .height(70.0)
                                    .show_axes([false, true])
                                    .show_grid(false)
                                    .allow_zoom(false)
                                    .allow_drag(false)
                                    .allow_scroll(false)
                                    .show_background(false)
                                    .include_x(0.0)
                                    .include_x(crate::core::session::RATE_HISTORY_LEN as f64)
                                    .include_y(0.0)
                                    .include_y(nominal * 1.2)
                                    .label_formatter(|_name, value| format!("{:.0} Hz", value.y))
                                    .show(ui, |plot_ui| {
                                        plot_ui.line(Line::new(points).color(colors::ACCENT).width(1.0));
                                    });
                            });
                    });
            });
    }
}
