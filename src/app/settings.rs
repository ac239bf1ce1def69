//! Settings sidebar: detection sensitivity

use eframe::egui;
use crate::control::ControlRequest;
use crate::core::SensitivityConfig;
use crate::theme::colors;
use super::TrailApp;

impl TrailApp {
    pub(crate) fn render_settings(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("settings")
            .default_width(260.0)
            .min_width(220.0)
            .resizable(true)
            .frame(egui::Frame::new().fill(colors::BG_PRIMARY).inner_margin(8.0))
            .show(ctx, |ui| {
                let group_frame = egui::Frame::new()
                    .stroke(egui::Stroke::new(1.0, colors::TEXT_MUTED.gamma_multiply(0.6)))
                    .corner_radius(4.0)
                    .inner_margin(6.0);

                group_frame.show(ui, |ui| {
                    ui.set_min_width(ui.available_width());
                    ui.label(egui::RichText::new("Detection sensitivity:").color(colors::TEXT_MUTED));
                    let slider_width = ui.available_width() - 60.0;
                    ui.spacing_mut().slider_width = slider_width;

                    let draft = &mut self.sensitivity_draft;

                    ui.label(egui::RichText::new("Min area (px)").color(colors::TEXT_SECONDARY));
                    ui.add(
                        egui::Slider::new(&mut draft.min_area, SensitivityConfig::AREA_RANGE)
                            .step_by(SensitivityConfig::AREA_STEP)
                            .clamping(egui::SliderClamping::Always),
                    );
                    ui.label(
                        egui::RichText::new("  Smaller picks up distant blobs")
                            .color(colors::TEXT_MUTED)
                            .small(),
                    );

                    ui.add_space(4.0);
                    ui.label(egui::RichText::new("Min circularity").color(colors::TEXT_SECONDARY));
                    ui.add(
                        egui::Slider::new(
                            &mut draft.min_circularity,
                            SensitivityConfig::CIRCULARITY_RANGE,
                        )
                        .step_by(SensitivityConfig::RATIO_STEP)
                        .fixed_decimals(2)
                        .clamping(egui::SliderClamping::Always),
                    );
                    ui.label(
                        egui::RichText::new("  1.0 = perfect circle")
                            .color(colors::TEXT_MUTED)
                            .small(),
                    );

                    ui.add_space(4.0);
                    ui.label(egui::RichText::new("Min solidity").color(colors::TEXT_SECONDARY));
                    ui.add(
                        egui::Slider::new(&mut draft.min_solidity, SensitivityConfig::SOLIDITY_RANGE)
                            .step_by(SensitivityConfig::RATIO_STEP)
                            .fixed_decimals(2)
                            .clamping(egui::SliderClamping::Always),
                    );
                    ui.label(
                        egui::RichText::new("  Higher rejects ragged shapes")
                            .color(colors::TEXT_MUTED)
                            .small(),
                    );
                });

                ui.add_space(8.0);

                ui.horizontal(|ui| {
                    if ui.button("Apply").clicked() {
                        let cfg = self.sensitivity_draft.clamped();
                        self.send_control(ControlRequest::SetSensitivity(cfg));
                    }
                    if ui.button("Reset Defaults").clicked() {
                        self.sensitivity_draft = SensitivityConfig::default();
                    }
                });
            });
    }
}
