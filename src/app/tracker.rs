//! Position canvas: paints a `TrailFrame` with the egui painter

use eframe::egui;
use tracing::trace;

use crate::core::{render, FrameContent, Surface, TrailFrame, DEFAULT_SURFACE_SIZE, WAITING_TEXT};
use crate::theme::{accent_with_alpha, colors};
use super::TrailApp;

const SEGMENT_WIDTH: f32 = 3.0;
const SEGMENT_ALPHA_SCALE: f32 = 0.8;
const MARKER_RADIUS: f32 = 2.0;
const HEAD_GLOW_RADIUS: f32 = 10.0;
const HEAD_GLOW_ALPHA: f32 = 0.3;
const HEAD_RADIUS: f32 = 5.0;

/// Last built frame and the inputs it was built from
pub(crate) struct FrameCache {
    revision: u64,
    surface: Surface,
    frame: TrailFrame,
}

impl TrailApp {
    pub(crate) fn render_tracker(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Position Tracker").color(colors::ACCENT).strong());

        let side = ui
            .available_width()
            .min(ui.available_height() - 80.0)
            .max(DEFAULT_SURFACE_SIZE);
        let (rect, _) = ui.allocate_exact_size(egui::vec2(side, side), egui::Sense::hover());

        let surface = Surface::new(rect.width(), rect.height());
        if !surface.is_drawable() || !ui.is_rect_visible(rect) {
            // Nothing to draw on; retried next frame
            trace!(width = surface.width, height = surface.height, "Tracker surface unavailable");
            return;
        }

        let frame = self.current_frame(surface);
        paint_frame(&ui.painter_at(rect), rect, frame);
    }

    /// Rebuild only when the session or the surface changed
    fn current_frame(&mut self, surface: Surface) -> &TrailFrame {
        let revision = self.session.revision();
        let cache = match self.frame_cache.take() {
            Some(cache) if cache.revision == revision && cache.surface == surface => cache,
            _ => FrameCache {
                revision,
                surface,
                frame: render(self.session.trail().iter(), self.session.is_active(), surface),
            },
        };
        &self.frame_cache.insert(cache).frame
    }
}

fn to_screen(rect: egui::Rect, p: [f32; 2]) -> egui::Pos2 {
    rect.min + egui::vec2(p[0], p[1])
}

fn paint_frame(painter: &egui::Painter, rect: egui::Rect, frame: &TrailFrame) {
    painter.rect_filled(rect, 4.0, colors::BG_SURFACE);

    let grid_stroke = egui::Stroke::new(1.0, egui::Color32::from_white_alpha(colors::GRID_ALPHA));
    for &(from, to) in &frame.grid {
        painter.line_segment([to_screen(rect, from), to_screen(rect, to)], grid_stroke);
    }

    match &frame.content {
        FrameContent::Waiting => {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                WAITING_TEXT,
                egui::FontId::proportional(12.0),
                colors::TEXT_SECONDARY,
            );
        }
        FrameContent::Trail {
            segments,
            head,
            readout,
        } => {
            for seg in segments {
                let to = to_screen(rect, seg.to);
                painter.line_segment(
                    [to_screen(rect, seg.from), to],
                    egui::Stroke::new(SEGMENT_WIDTH, accent_with_alpha(seg.alpha * SEGMENT_ALPHA_SCALE)),
                );
                painter.circle_filled(to, MARKER_RADIUS, accent_with_alpha(seg.alpha));
            }

            let head = to_screen(rect, *head);
            painter.circle_filled(head, HEAD_GLOW_RADIUS, accent_with_alpha(HEAD_GLOW_ALPHA));
            painter.circle_filled(head, HEAD_RADIUS, colors::ACCENT);

            painter.text(
                rect.left_bottom() + egui::vec2(6.0, -6.0),
                egui::Align2::LEFT_BOTTOM,
                readout,
                egui::FontId::monospace(11.0),
                colors::TEXT_PRIMARY,
            );
        }
    }
}
