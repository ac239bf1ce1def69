//! Command log with target prompt input

use eframe::egui;
use crate::control::ChatRole;
use crate::theme::colors;
use super::TrailApp;

impl TrailApp {
    pub(crate) fn render_chat(&mut self, ctx: &egui::Context) {
        let active = self.session.is_active();

        egui::SidePanel::right("command_log")
            .default_width(300.0)
            .min_width(220.0)
            .resizable(true)
            .frame(egui::Frame::new().fill(colors::BG_PRIMARY).inner_margin(8.0))
            .show(ctx, |ui| {
                ui.label(egui::RichText::new("Commands").color(colors::ACCENT).strong());
                ui.add_space(4.0);

                let input_height = 32.0;
                egui::ScrollArea::vertical()
                    .max_height(ui.available_height() - input_height)
                    .stick_to_bottom(true)
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        for msg in self.chat.messages() {
                            let text = egui::RichText::new(&msg.text);
                            let text = match msg.role {
                                ChatRole::User => text.color(colors::TEXT_PRIMARY),
                                ChatRole::System => text.color(colors::TEXT_SECONDARY),
                            };
                            let layout = match msg.role {
                                ChatRole::User => egui::Layout::top_down(egui::Align::Max),
                                ChatRole::System => egui::Layout::top_down(egui::Align::Min),
                            };
                            ui.with_layout(layout, |ui| {
                                ui.add(egui::Label::new(text).wrap());
                            });
                            ui.add_space(2.0);
                        }
                    });

                ui.horizontal(|ui| {
                    let hint = if active {
                        "Type a color blob (e.g., \"blue blob\")"
                    } else {
                        "Start detection first"
                    };
                    let edit = ui.add_enabled(
                        active,
                        egui::TextEdit::singleline(&mut self.chat_input)
                            .hint_text(hint)
                            .desired_width(ui.available_width() - 50.0),
                    );
                    let entered =
                        edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    let clicked = ui
                        .add_enabled(active, egui::Button::new("Send"))
                        .clicked();

                    if entered || clicked {
                        let input = std::mem::take(&mut self.chat_input);
                        if let Some(request) = self.chat.submit(&input, active) {
                            self.send_control(request);
                        }
                        if entered {
                            edit.request_focus();
                        }
                    }
                });
            });
    }
}
