//! Dark dashboard theme with a single green accent

use egui::Color32;

pub mod colors {
    use super::Color32;

    // Backgrounds
    pub const BG_PRIMARY: Color32 = Color32::from_rgb(0, 0, 0);
    pub const BG_ELEVATED: Color32 = Color32::from_rgb(12, 12, 12);
    pub const BG_HOVER: Color32 = Color32::from_rgb(24, 24, 24);
    /// Tracker surface backdrop, black at 0.8
    pub const BG_SURFACE: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 204);

    // Text
    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(255, 255, 255);
    pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(160, 160, 160);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(80, 80, 80);

    pub const BORDER: Color32 = Color32::from_rgb(40, 40, 40);

    /// #4CAF50, titles, trail and head marker
    pub const ACCENT: Color32 = Color32::from_rgb(76, 175, 80);
    pub const ACCENT_RGB: [u8; 3] = [76, 175, 80];

    // Status
    pub const OK: Color32 = Color32::from_rgb(100, 200, 100);
    pub const WARN: Color32 = Color32::from_rgb(200, 200, 100);
    pub const ERROR: Color32 = Color32::from_rgb(200, 100, 100);

    /// Grid lines, white at 0.1
    pub const GRID_ALPHA: u8 = 26;
}

/// Accent color with alpha in `[0, 1]`
pub fn accent_with_alpha(alpha: f32) -> Color32 {
    let [r, g, b] = colors::ACCENT_RGB;
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

pub fn dashboard_visuals() -> egui::Visuals {
    use colors::*;

    let mut visuals = egui::Visuals::dark();

    visuals.panel_fill = BG_PRIMARY;
    visuals.window_fill = BG_ELEVATED;
    visuals.extreme_bg_color = BG_PRIMARY;
    visuals.faint_bg_color = BG_ELEVATED;
    visuals.override_text_color = Some(TEXT_PRIMARY);

    visuals.widgets.noninteractive.bg_fill = BG_PRIMARY;
    visuals.widgets.noninteractive.fg_stroke = egui::Stroke::new(1.0, TEXT_MUTED);
    visuals.widgets.noninteractive.bg_stroke = egui::Stroke::new(1.0, BORDER);

    visuals.widgets.inactive.bg_fill = BG_PRIMARY;
    visuals.widgets.inactive.fg_stroke = egui::Stroke::new(1.0, TEXT_SECONDARY);
    visuals.widgets.inactive.bg_stroke = egui::Stroke::new(1.0, BORDER);
    visuals.widgets.inactive.weak_bg_fill = BG_PRIMARY;

    visuals.widgets.hovered.bg_fill = BG_ELEVATED;
    visuals.widgets.hovered.fg_stroke = egui::Stroke::new(1.0, TEXT_PRIMARY);
    visuals.widgets.hovered.bg_stroke = egui::Stroke::new(1.0, ACCENT);
    visuals.widgets.hovered.weak_bg_fill = BG_ELEVATED;

    visuals.widgets.active.bg_fill = BG_HOVER;
    visuals.widgets.active.fg_stroke = egui::Stroke::new(1.0, TEXT_PRIMARY);
    visuals.widgets.active.bg_stroke = egui::Stroke::new(1.0, ACCENT);
    visuals.widgets.active.weak_bg_fill = BG_HOVER;

    // Slider fill and text selection
    visuals.selection.bg_fill = ACCENT;
    visuals.selection.stroke = egui::Stroke::new(1.0, TEXT_PRIMARY);

    visuals.hyperlink_color = ACCENT;

    visuals.window_shadow = egui::Shadow::NONE;
    visuals.popup_shadow = egui::Shadow::NONE;

    visuals
}
