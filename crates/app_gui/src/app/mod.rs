mod results;
mod upload;

use eframe::{App, Frame, egui};
use leaf_core::{
    CLASS_NAMES, Detector, InferenceClient, Notification, SelectedImage, Stage, Worker,
    WorkerEvent,
};
use std::path::Path;
use std::sync::Arc;
use upload::DropSource;

/// Extensions offered by the file picker.
const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "bmp", "gif", "webp", "tiff"];

pub struct UiApp {
    detector: Detector,
    worker: Worker,
    base_url: String,
    preview_tex: Option<egui::TextureHandle>,
    notification: Option<Notification>,
    status: String,
    app_version: &'static str,
}

impl UiApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        client: Arc<dyn InferenceClient>,
        base_url: String,
    ) -> Self {
        let ctx = cc.egui_ctx.clone();
        Self {
            detector: Detector::new(),
            worker: Worker::new(client, move || ctx.request_repaint()),
            base_url,
            preview_tex: None,
            notification: None,
            status: String::new(),
            app_version: env!("LEAF_APP_VERSION"),
        }
    }

    fn select(&mut self, image: SelectedImage) {
        self.preview_tex = None;
        self.status = format!("Selected {}", image.name);
        let ticket = self.detector.select_image(image);
        self.worker.decode_preview(ticket);
    }

    fn select_path(&mut self, path: &Path) {
        match SelectedImage::from_path(path) {
            Ok(image) => self.select(image),
            Err(e) => {
                tracing::warn!("{e:#}");
                self.status = format!("Could not open file: {e:#}");
            }
        }
    }

    fn clear(&mut self) {
        self.detector.clear_image();
        self.preview_tex = None;
        self.status.clear();
    }

    fn submit(&mut self) {
        if let Some(ticket) = self.detector.begin_submission() {
            self.status = format!("Uploading {}...", ticket.image.name);
            self.worker.submit(ticket);
        }
    }

    fn pick_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("image", &IMAGE_EXTENSIONS)
            .pick_file()
        {
            self.select_path(&path);
        }
    }

    fn take_dropped_file(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = leaf_core::pick_first(dropped) else {
            return;
        };
        match upload::drop_source(file) {
            Some(DropSource::Path(path)) => self.select_path(&path),
            Some(DropSource::Image(image)) => self.select(image),
            None => tracing::debug!("dropped file has neither a path nor contents"),
        }
    }

    fn process_events(&mut self) {
        for event in self.worker.poll() {
            match event {
                WorkerEvent::HealthChecked(Ok(())) => {
                    self.status = "Backend is up".to_string();
                }
                WorkerEvent::HealthChecked(Err(e)) => {
                    self.status = format!("Backend unavailable: {e}");
                }
                finished @ WorkerEvent::SubmissionFinished { epoch, .. } => {
                    // "Uploading ..." belongs to the current selection only.
                    if self.detector.is_current(epoch) {
                        self.status.clear();
                    }
                    if let Some(note) = self.detector.handle(finished) {
                        self.notification = Some(note);
                    }
                }
                decoded => {
                    self.detector.handle(decoded);
                }
            }
        }
    }

    fn sync_preview_texture(&mut self, ctx: &egui::Context) {
        if self.preview_tex.is_some() {
            return;
        }
        if let Some(preview) = self.detector.preview() {
            let color = egui::ColorImage::from_rgba_unmultiplied(preview.size(), &preview.rgba);
            self.preview_tex =
                Some(ctx.load_texture("leaf-preview", color, egui::TextureOptions::LINEAR));
        }
    }

    fn render_notification(&mut self, ctx: &egui::Context) {
        let Some(note) = &self.notification else {
            return;
        };
        let mut dismissed = false;
        let modal = egui::Modal::new(egui::Id::new("notification")).show(ctx, |ui| {
            ui.set_max_width(320.0);
            ui.label(&note.message);
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });
        if dismissed || modal.should_close() {
            self.notification = None;
        }
    }

    fn render_footer(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(format!("v{}", self.app_version));
            ui.separator();
            ui.label(&self.base_url);
            if ui.button("Check backend").clicked() {
                self.status = "Checking backend...".to_string();
                self.worker.check_health();
            }
            if !self.status.is_empty() {
                ui.label(&self.status);
            }
        });
    }
}

impl App for UiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.process_events();
        self.take_dropped_file(ctx);
        self.sync_preview_texture(ctx);

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| self.render_footer(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("Leaf Disease Detector");
                ui.label("Upload a leafy vegetable image to get a quick diagnosis!");
            });
            ui.add_space(16.0);

            self.render_drop_area(ui);
            ui.add_space(12.0);

            let pending = self.detector.stage() == Stage::Pending;
            ui.horizontal(|ui| {
                let button =
                    egui::Button::new("Predict Disease").min_size(egui::vec2(160.0, 32.0));
                if ui.add_enabled(self.detector.can_submit(), button).clicked() {
                    self.submit();
                }
                if pending {
                    ui.add(egui::Spinner::new());
                }
            });

            self.render_results(ui);

            ui.add_space(16.0);
            ui.collapsing("Recognized diseases", |ui| {
                for name in CLASS_NAMES {
                    ui.label(name);
                }
            });
        });

        self.render_notification(ctx);
    }
}
