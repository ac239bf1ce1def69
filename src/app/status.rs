//! Status panel: target, detection and sampling rate

use eframe::egui;
use crate::core::Detection;
use crate::theme::colors;
use super::TrailApp;

/// Position to three decimals, or a dash when nothing is detected
pub(crate) fn position_text(detection: &Detection) -> String {
    match detection.position() {
        Some(pos) => format!("({:.3}, {:.3})", pos.x, pos.y),
        None => "-".to_string(),
    }
}

impl TrailApp {
    pub(crate) fn render_status(&self, ui: &mut egui::Ui) {
        let snapshot = self.session.snapshot();
        let detected = snapshot.detection.is_detected();

        egui::Frame::new()
            .stroke(egui::Stroke::new(1.0, colors::BORDER))
            .corner_radius(4.0)
            .inner_margin(6.0)
            .show(ui, |ui| {
                egui::Grid::new("status_grid")
                    .num_columns(2)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(egui::RichText::new("Status").color(colors::TEXT_MUTED));
                        let (text, color) = if self.session.is_active() {
                            ("Active", colors::OK)
                        } else {
                            ("Stopped", colors::TEXT_MUTED)
                        };
                        ui.colored_label(color, text);
                        ui.end_row();

                        ui.label(egui::RichText::new("Target").color(colors::TEXT_MUTED));
                        ui.label(format!("{} blob", snapshot.target));
                        ui.end_row();

                        ui.label(egui::RichText::new("Detected").color(colors::TEXT_MUTED));
                        let (text, color) = if detected {
                            ("Yes", colors::OK)
                        } else {
                            ("No", colors::TEXT_SECONDARY)
                        };
                        ui.colored_label(color, text);
                        ui.end_row();

                        ui.label(egui::RichText::new("Position").color(colors::TEXT_MUTED));
                        ui.monospace(position_text(&snapshot.detection));
                        ui.end_row();

                        ui.label(egui::RichText::new("Sampling").color(colors::TEXT_MUTED));
                        ui.monospace(format!("{} Hz", self.session.observed_rate()));
                        ui.end_row();
                    });
            });
    }
}
