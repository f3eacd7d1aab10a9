//! Prediction panel.

use super::UiApp;
use eframe::egui::{self, Color32, RichText};
use leaf_core::is_known_class;

const LABEL_WIDTH: f32 = 150.0;
const BAR_HEIGHT: f32 = 20.0;

impl UiApp {
    /// Renders the top-1 label and the ranked breakdown, if any.
    pub(super) fn render_results(&self, ui: &mut egui::Ui) {
        let Some(view) = self.detector.result_view() else {
            return;
        };
        ui.add_space(16.0);
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Prediction:");
                ui.heading(RichText::new(&view.label).strong());
            });
            if !is_known_class(&view.label) {
                ui.label(RichText::new("Not in the recognized disease list").weak());
            }

            if view.rows.is_empty() {
                return;
            }
            ui.add_space(8.0);
            ui.label(RichText::new("Top 3 Probabilities:").weak());
            for row in &view.rows {
                let fill = if row.emphasized {
                    Color32::from_rgb(46, 139, 87)
                } else {
                    Color32::from_rgb(70, 140, 200)
                };
                ui.horizontal(|ui| {
                    ui.add_sized(
                        [LABEL_WIDTH, BAR_HEIGHT],
                        egui::Label::new(RichText::new(&row.label).strong()),
                    );
                    ui.add(
                        egui::ProgressBar::new(row.fill)
                            .text(row.percent.clone())
                            .fill(fill)
                            .desired_height(BAR_HEIGHT),
                    );
                });
            }
        });
    }
}
