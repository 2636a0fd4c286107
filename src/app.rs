// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the main application structure that implements
//! the egui::App trait. It owns the editing engine and the annotation
//! store, loads images in the background and routes UI actions to the
//! editor.

use crate::ui::properties::{PanelState, PropertiesAction};
use crate::ui::toolbar::ToolbarAction;
use crate::ui::{canvas, properties, toolbar};
use labelcanvas::config::EditorConfig;
use labelcanvas::editor::{Editor, EditorKey, Primitive};
use labelcanvas::io::media::{self, LoadedImage};
use labelcanvas::io::serialization;
use labelcanvas::io::{AnnotationStore, ImageRecord, LocalStore};
use labelcanvas::models::{Annotation, ProjectData, ShapeId};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::time::Instant;

/// Where the image on the canvas came from.
#[derive(Debug, Clone)]
enum ImageSource {
    Stored(ImageRecord),
    File(PathBuf),
}

impl ImageSource {
    fn media_file(&self) -> String {
        match self {
            ImageSource::Stored(record) => record.public_url.clone(),
            ImageSource::File(path) => path.to_string_lossy().into_owned(),
        }
    }

    fn image_id(&self) -> Option<String> {
        match self {
            ImageSource::Stored(record) => Some(record.id.clone()),
            ImageSource::File(_) => None,
        }
    }
}

/// Result of background image loading operation.
struct LoadedImageData {
    image: LoadedImage,
    source: ImageSource,
    annotations: Vec<Annotation>,
}

/// Status line message.
struct Notice {
    text: String,
    error: bool,
}

/// Main application state.
pub struct LabelCanvasApp {
    editor: Editor,

    /// Local image/annotation store, if it could be opened
    store: Option<LocalStore>,

    /// Stored images for the recent menu, newest first
    images: Vec<ImageRecord>,

    /// Source of the current image
    source: Option<ImageSource>,

    /// Loaded image texture for display
    image_texture: Option<egui::TextureHandle>,

    /// Image dimensions (width, height)
    image_size: Option<(u32, u32)>,

    /// Fit the view to the image on the next frame
    fit_pending: bool,

    /// Receiver for background image loading
    image_loader: Option<Receiver<Result<LoadedImageData, String>>>,

    /// Loading state message
    loading_message: Option<String>,

    notice: Option<Notice>,

    panel: PanelState,

    /// Text being typed into an on-canvas text shape, and that shape
    text_buffer: String,
    text_target: Option<ShapeId>,
}

impl LabelCanvasApp {
    pub fn new(config: EditorConfig) -> Self {
        let store = match LocalStore::open(config.store_dir.clone()) {
            Ok(store) => Some(store),
            Err(e) => {
                log::error!("Annotation store unavailable: {:#}", e);
                None
            }
        };
        let mut app = Self {
            editor: Editor::new(config),
            store,
            images: Vec::new(),
            source: None,
            image_texture: None,
            image_size: None,
            fit_pending: false,
            image_loader: None,
            loading_message: None,
            notice: None,
            panel: PanelState::default(),
            text_buffer: String::new(),
            text_target: None,
        };
        app.refresh_images();
        app
    }

    fn info(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            error: false,
        });
    }

    fn error(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::error!("{}", text);
        self.notice = Some(Notice { text, error: true });
    }

    fn refresh_images(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        match store.list_images() {
            Ok(images) => self.images = images,
            Err(e) => self.error(format!("Failed to list images: {:#}", e)),
        }
    }

    /// Run a loading job on a background thread.
    fn spawn_loader<F>(&mut self, message: &str, job: F)
    where
        F: FnOnce() -> Result<LoadedImageData, String> + Send + 'static,
    {
        let (sender, receiver) = channel();
        self.image_loader = Some(receiver);
        self.loading_message = Some(message.to_string());
        std::thread::spawn(move || {
            let _ = sender.send(job());
        });
    }

    /// Upload an image into the store (when available) and open it.
    fn open_image_file(&mut self, path: PathBuf) {
        if !media::is_supported(&path) {
            self.error(format!("Unsupported image type: {}", path.display()));
            return;
        }
        let store = self.store.clone();
        self.spawn_loader("Loading image...", move || {
            let (source, image_path) = match store {
                Some(mut store) => {
                    let record = store
                        .upload_image(&path)
                        .map_err(|e| format!("Failed to upload image: {:#}", e))?;
                    let stored = store.image_path(&record);
                    (ImageSource::Stored(record), stored)
                }
                None => (ImageSource::File(path.clone()), path),
            };
            let image = media::load_image(&image_path).map_err(|e| format!("{:#}", e))?;
            log::info!("Loaded image: {} ({}x{})", image_path.display(), image.width, image.height);
            Ok(LoadedImageData {
                image,
                source,
                annotations: Vec::new(),
            })
        });
    }

    /// Open a stored image together with its saved annotations.
    fn open_stored_image(&mut self, record: ImageRecord) {
        let Some(store) = self.store.clone() else {
            return;
        };
        self.spawn_loader("Loading image...", move || {
            let image = media::load_image(&store.image_path(&record)).map_err(|e| format!("{:#}", e))?;
            let annotations = store
                .load_annotations(&record.id)
                .map_err(|e| format!("Failed to load annotations: {:#}", e))?;
            Ok(LoadedImageData {
                image,
                source: ImageSource::Stored(record),
                annotations,
            })
        });
    }

    /// Import a project file and load the image it references.
    fn import_project(&mut self, path: PathBuf) {
        let store = self.store.clone();
        self.spawn_loader("Loading annotations and image...", move || {
            let project = serialization::import_project(&path).map_err(|e| format!("{:#}", e))?;
            log::info!("Imported {} annotations from {}", project.annotations.len(), path.display());

            let record = match (&store, &project.image_id) {
                (Some(store), Some(id)) => store.find_image(id).map_err(|e| format!("{:#}", e))?,
                _ => None,
            };
            let source = match record {
                Some(record) => ImageSource::Stored(record),
                None => ImageSource::File(PathBuf::from(&project.media_file)),
            };
            let image_path = PathBuf::from(source.media_file());
            if !image_path.exists() {
                return Err(format!("Referenced image not found: {}", image_path.display()));
            }
            let image = media::load_image(&image_path).map_err(|e| format!("{:#}", e))?;
            Ok(LoadedImageData {
                image,
                source,
                annotations: project.annotations,
            })
        });
    }

    fn poll_loader(&mut self, ctx: &egui::Context) {
        let Some(receiver) = &self.image_loader else {
            return;
        };
        let Ok(result) = receiver.try_recv() else {
            return;
        };
        self.image_loader = None;
        self.loading_message = None;

        match result {
            Ok(loaded) => {
                let color_image =
                    egui::ColorImage::from_rgba_unmultiplied(loaded.image.size(), &loaded.image.pixels);
                let texture = ctx.load_texture("loaded_image", color_image, egui::TextureOptions::LINEAR);
                self.image_texture = Some(texture);
                self.image_size = Some((loaded.image.width, loaded.image.height));
                self.fit_pending = true;
                self.editor.load(&loaded.annotations);
                self.panel.invalidate();
                self.info(format!("Opened image with {} annotations", loaded.annotations.len()));
                self.source = Some(loaded.source);
                self.refresh_images();
            }
            Err(e) => self.error(e),
        }
    }

    fn save_annotations(&mut self) {
        let Some(ImageSource::Stored(record)) = &self.source else {
            self.error("Image is not in the store; use Export instead");
            return;
        };
        let id = record.id.clone();
        let Some(store) = self.store.as_mut() else {
            return;
        };
        match store.save_annotations(&id, self.editor.annotations()) {
            Ok(()) => {
                let count = self.editor.annotations().len();
                self.info(format!("Saved {} annotations", count));
            }
            Err(e) => self.error(format!("Failed to save annotations: {:#}", e)),
        }
    }

    fn export_annotations(&mut self, path: PathBuf) {
        let Some(source) = &self.source else {
            return;
        };
        let (width, height) = self.image_size.unwrap_or((0, 0));
        let mut project = ProjectData::new(source.media_file(), width, height)
            .with_annotations(self.editor.annotations().to_vec());
        project.image_id = source.image_id();

        let result = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => serialization::export_yaml(&project, &path),
            _ => serialization::export_json(&project, &path),
        };
        match result {
            Ok(()) => self.info(format!("Exported to {}", path.display())),
            Err(e) => self.error(format!("Failed to export annotations: {:#}", e)),
        }
    }

    fn delete_current_image(&mut self) {
        let Some(ImageSource::Stored(record)) = self.source.clone() else {
            return;
        };
        let Some(store) = self.store.as_mut() else {
            return;
        };
        match store.delete_image(&record.id) {
            Ok(_) => {
                self.source = None;
                self.image_texture = None;
                self.image_size = None;
                self.editor.load(&[]);
                self.info(format!("Deleted {}", record.filename));
                self.refresh_images();
            }
            Err(e) => self.error(format!("Failed to delete image: {:#}", e)),
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (escape, enter, delete, undo, redo, save) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Escape),
                i.key_pressed(egui::Key::Enter),
                i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace),
                i.modifiers.command && i.key_pressed(egui::Key::Z) && !i.modifiers.shift,
                (i.modifiers.command && i.modifiers.shift && i.key_pressed(egui::Key::Z))
                    || (i.modifiers.command && i.key_pressed(egui::Key::Y)),
                i.modifiers.command && i.key_pressed(egui::Key::S),
            )
        });
        if escape {
            self.editor.key(EditorKey::Escape);
        }
        if enter {
            self.editor.key(EditorKey::Enter);
        }
        if delete {
            self.editor.key(EditorKey::Delete);
        }
        if undo {
            self.editor.undo();
        }
        if redo {
            self.editor.redo();
        }
        if save {
            self.save_annotations();
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Image...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Images", media::IMAGE_EXTENSIONS)
                        .pick_file()
                    {
                        self.open_image_file(path);
                    }
                    ui.close_menu();
                }
                ui.add_enabled_ui(!self.images.is_empty(), |ui| {
                    ui.menu_button("Recent Images", |ui| {
                        let mut picked = None;
                        for record in &self.images {
                            let text = format!(
                                "{}  ({})",
                                record.filename,
                                record.created_at.format("%Y-%m-%d %H:%M")
                            );
                            if ui.button(text).clicked() {
                                picked = Some(record.clone());
                            }
                        }
                        if let Some(record) = picked {
                            self.open_stored_image(record);
                            ui.close_menu();
                        }
                    });
                });
                let stored = matches!(self.source, Some(ImageSource::Stored(_)));
                if ui.add_enabled(stored, egui::Button::new("Save Annotations (Ctrl+S)")).clicked() {
                    self.save_annotations();
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Import Annotations...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Annotations", &["json", "yaml", "yml"])
                        .pick_file()
                    {
                        self.import_project(path);
                    }
                    ui.close_menu();
                }
                ui.add_enabled_ui(self.source.is_some(), |ui| {
                    ui.menu_button("Export Annotations", |ui| {
                        if ui.button("Export as JSON...").clicked() {
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter("JSON", &["json"])
                                .set_file_name("annotations.json")
                                .save_file()
                            {
                                self.export_annotations(path);
                            }
                            ui.close_menu();
                        }
                        if ui.button("Export as YAML...").clicked() {
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter("YAML", &["yaml", "yml"])
                                .set_file_name("annotations.yaml")
                                .save_file()
                            {
                                self.export_annotations(path);
                            }
                            ui.close_menu();
                        }
                    });
                });
                ui.separator();
                if ui.add_enabled(stored, egui::Button::new("Delete Image")).clicked() {
                    self.delete_current_image();
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("Edit", |ui| {
                if ui
                    .add_enabled(self.editor.can_undo(), egui::Button::new("Undo (Ctrl+Z)"))
                    .clicked()
                {
                    self.editor.undo();
                    ui.close_menu();
                }
                if ui
                    .add_enabled(self.editor.can_redo(), egui::Button::new("Redo (Ctrl+Shift+Z)"))
                    .clicked()
                {
                    self.editor.redo();
                    ui.close_menu();
                }
                ui.separator();
                let has_selection =
                    !self.editor.selection().is_empty() || self.editor.active_polygon().is_some();
                if ui
                    .add_enabled(has_selection, egui::Button::new("Delete Selected"))
                    .clicked()
                {
                    self.editor.delete_selection();
                    ui.close_menu();
                }
            });

            ui.menu_button("View", |ui| {
                if ui.button("Zoom In").clicked() {
                    self.editor.zoom_in();
                    ui.close_menu();
                }
                if ui.button("Zoom Out").clicked() {
                    self.editor.zoom_out();
                    ui.close_menu();
                }
                if ui.button("Reset Zoom").clicked() {
                    self.editor.reset_view();
                    ui.close_menu();
                }
                if ui
                    .add_enabled(self.image_size.is_some(), egui::Button::new("Fit Image"))
                    .clicked()
                {
                    self.fit_pending = true;
                    ui.close_menu();
                }
            });
        });
    }

    /// Inline editor for a text shape that was just placed or double-clicked.
    fn text_overlay(&mut self, ctx: &egui::Context, canvas_rect: egui::Rect) {
        let Some(id) = self.editor.scene().text_editing().cloned() else {
            self.text_target = None;
            return;
        };
        let Some(shape) = self.editor.scene().get(&id) else {
            return;
        };
        let anchor = self.editor.viewport().to_screen(shape.transform.origin());
        if self.text_target.as_ref() != Some(&id) {
            if let Primitive::Text { content, .. } = &shape.primitive {
                self.text_buffer = content.clone();
            }
            self.text_target = Some(id.clone());
        }
        let pos = canvas_rect.min + egui::vec2(anchor.x as f32, anchor.y as f32);

        let area = egui::Area::new(egui::Id::new("text_overlay"))
            .fixed_pos(pos)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                let response = ui.text_edit_singleline(&mut self.text_buffer);
                if !response.has_focus() && !response.lost_focus() {
                    response.request_focus();
                }
                response.lost_focus()
            });
        if area.inner {
            let text = std::mem::take(&mut self.text_buffer);
            if text.trim().is_empty() {
                self.editor.scene_mut().end_text_edit();
            } else {
                self.editor.set_text(&id, &text);
            }
        }
    }
}

impl eframe::App for LabelCanvasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_loader(ctx);

        // Request repaint if still loading (to update spinner)
        if self.loading_message.is_some() {
            ctx.request_repaint();
        }

        let now = Instant::now();
        self.editor.tick(now);
        if let Some(wait) = self.editor.pending_commit_in(now) {
            ctx.request_repaint_after(wait);
        }

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.menu_bar(ctx, ui);
        });

        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| toolbar::show(ui, &self.editor))
            .inner;
        match toolbar_action {
            ToolbarAction::SetMode(mode) => self.editor.set_mode(mode),
            ToolbarAction::ZoomIn => self.editor.zoom_in(),
            ToolbarAction::ZoomOut => self.editor.zoom_out(),
            ToolbarAction::ResetZoom => self.editor.reset_view(),
            ToolbarAction::Undo => {
                self.editor.undo();
            }
            ToolbarAction::Redo => {
                self.editor.redo();
            }
            ToolbarAction::None => {}
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Tool: {}", self.editor.mode().label()));
                ui.separator();
                ui.label(format!("{} annotations", self.editor.annotations().len()));
                if let Some(notice) = &self.notice {
                    ui.separator();
                    let color = if notice.error {
                        egui::Color32::LIGHT_RED
                    } else {
                        egui::Color32::from_gray(180)
                    };
                    ui.label(egui::RichText::new(&notice.text).color(color));
                }
            });
        });

        let selected = self
            .editor
            .active_polygon()
            .or_else(|| self.editor.selection().first())
            .cloned();
        let properties_action = egui::SidePanel::right("properties")
            .default_width(250.0)
            .show(ctx, |ui| {
                properties::show(ui, self.editor.annotations(), selected.as_ref(), &mut self.panel)
            })
            .inner;
        match properties_action {
            PropertiesAction::Select(id) => self.editor.select(&id),
            PropertiesAction::SetLabel(id, label) => {
                self.editor.assign_label(&[id], Some(&label));
                self.panel.invalidate();
            }
            PropertiesAction::SetText(id, text) => {
                self.editor.set_text(&id, &text);
                self.panel.invalidate();
            }
            PropertiesAction::SetTransform {
                id,
                angle,
                scale_x,
                scale_y,
            } => {
                if !self.editor.set_transform(&id, angle, scale_x, scale_y) {
                    self.info("Transform not applied");
                }
                self.panel.invalidate();
            }
            PropertiesAction::Delete(id) => {
                self.editor.delete_shapes(&[id]);
            }
            PropertiesAction::None => {}
        }

        self.handle_keyboard(ctx);

        let canvas_rect = egui::CentralPanel::default()
            .show(ctx, |ui| {
                if let Some(message) = &self.loading_message {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.spinner();
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new(message)
                                    .size(16.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                        });
                    });
                } else {
                    canvas::show(ui, &mut self.editor, &self.image_texture, self.image_size);
                }
                ui.min_rect()
            })
            .inner;

        if self.fit_pending {
            if let Some((w, h)) = self.image_size {
                self.editor.scene_mut().viewport.fit(w as f64, h as f64);
            }
            self.fit_pending = false;
        }

        self.text_overlay(ctx, canvas_rect);
    }
}
