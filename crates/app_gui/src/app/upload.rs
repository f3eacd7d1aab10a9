//! Drop area: preview, remove button and the click-to-browse target.

use super::UiApp;
use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Stroke, StrokeKind, vec2};
use leaf_core::SelectedImage;
use std::path::PathBuf;

const DROP_AREA_HEIGHT: f32 = 280.0;
const REMOVE_BUTTON_SIZE: f32 = 26.0;

impl UiApp {
    /// Renders the drop target; clicking it opens the file picker.
    pub(super) fn render_drop_area(&mut self, ui: &mut egui::Ui) {
        let hovering_files = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());
        let size = vec2(ui.available_width(), DROP_AREA_HEIGHT);
        let (rect, response) = ui.allocate_exact_size(size, Sense::click());
        let painter = ui.painter_at(rect);

        let accent = Color32::from_rgb(46, 139, 87);
        let stroke_color = if hovering_files || response.hovered() {
            accent
        } else {
            Color32::GRAY
        };
        painter.rect_filled(rect, 8.0, ui.visuals().extreme_bg_color);
        painter.rect_stroke(
            rect,
            8.0,
            Stroke::new(1.5, stroke_color),
            StrokeKind::Inside,
        );

        if let Some(tex) = &self.preview_tex {
            let image_rect = fit_centered(tex.size_vec2(), rect.shrink(12.0));
            let uv = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            painter.image(tex.id(), image_rect, uv, Color32::WHITE);
        } else {
            let text = match self.detector.selected() {
                Some(image) => format!("{}\n(no preview available)", image.name),
                None => "Drag & drop an image here or click to browse".to_string(),
            };
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                text,
                FontId::proportional(16.0),
                ui.visuals().weak_text_color(),
            );
        }

        let mut removed = false;
        if self.detector.selected().is_some() {
            let button_rect = Rect::from_min_size(
                rect.right_top() + vec2(-REMOVE_BUTTON_SIZE - 8.0, 8.0),
                vec2(REMOVE_BUTTON_SIZE, REMOVE_BUTTON_SIZE),
            );
            removed = ui
                .put(button_rect, egui::Button::new("✖"))
                .on_hover_text("Remove image")
                .clicked();
        }

        if removed {
            self.clear();
        } else if response.clicked() {
            self.pick_file();
        }
    }
}

/// What a dropped file gives us to load from.
#[derive(Debug, PartialEq)]
pub(super) enum DropSource {
    /// Native drop: read from disk.
    Path(PathBuf),
    /// Web drop: contents arrive inline.
    Image(SelectedImage),
}

/// Desktop drops carry a path, web drops carry the bytes. An empty MIME
/// from the platform is inferred from the name and contents instead.
pub(super) fn drop_source(file: egui::DroppedFile) -> Option<DropSource> {
    if let Some(path) = file.path {
        return Some(DropSource::Path(path));
    }
    let bytes = file.bytes?;
    Some(DropSource::Image(SelectedImage::from_bytes(
        file.name,
        Some(file.mime.as_str()),
        bytes,
    )))
}

/// Largest rect with the aspect ratio of `content` that fits in `bounds`.
fn fit_centered(content: egui::Vec2, bounds: Rect) -> Rect {
    if content.x <= 0.0 || content.y <= 0.0 {
        return bounds;
    }
    let scale = (bounds.width() / content.x)
        .min(bounds.height() / content.y)
        .min(1.0);
    Rect::from_center_size(bounds.center(), content * scale)
}
