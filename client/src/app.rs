use std::time::Duration;

use debounce_loader::LoaderConfig;
use egui::color_picker::Alpha;
use egui::{Color32, RichText, ScrollArea, Sense, Spinner, TextEdit, Vec2};
use log::warn;

use crate::model::SearchModel;

pub struct DemoApp {
    model: SearchModel,
    query: String,
    bg_color_picked: Color32,
}

impl DemoApp {
    pub(crate) const SEARCH_DEBOUNCE_MS: Option<&'static str> = option_env!("SEARCH_DEBOUNCE_MS");
    const SWATCH_SIZE: Vec2 = Vec2::new(160.0, 40.0);

    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let model = SearchModel::new(search_config().debounce_time());
        {
            let egui_ctx = cc.egui_ctx.clone();
            model.on_change(move || egui_ctx.request_repaint());
        }

        DemoApp {
            model,
            query: String::new(),
            bg_color_picked: Color32::TRANSPARENT,
        }
    }
}

/// Search timing, optionally overridden at build time.
fn search_config() -> LoaderConfig {
    match DemoApp::SEARCH_DEBOUNCE_MS.map(str::parse::<u64>) {
        Some(Ok(debounce_time_ms)) => LoaderConfig { debounce_time_ms },
        Some(Err(e)) => {
            warn!("ignoring invalid SEARCH_DEBOUNCE_MS: {e}");
            LoaderConfig::default()
        }
        None => LoaderConfig::default(),
    }
}

impl eframe::App for DemoApp {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Duration::from_secs_f64(ctx.input(|i| i.time));
        self.model.tick(now);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(RichText::new("Debounced Search").strong());
            ui.add_space(12.0);

            ui.horizontal(|ui| {
                let response =
                    ui.add(TextEdit::singleline(&mut self.query).hint_text("Type to search"));
                if response.changed() {
                    self.model.edit_query(self.query.clone());
                }

                if self.model.is_searching() {
                    ui.add(Spinner::new());
                    ui.label("waiting for typing to pause");
                } else {
                    ui.label(RichText::new("idle").weak());
                }
            });

            ui.add_space(8.0);
            ui.label(RichText::new("Settled Searches").strong());
            ScrollArea::vertical().max_height(160.0).show(ui, |ui| {
                for query in self.model.settled_searches() {
                    ui.monospace(query);
                }
            });

            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Set Background Color");
                let color_response = egui::widgets::color_picker::color_edit_button_srgba(
                    ui,
                    &mut self.bg_color_picked,
                    Alpha::BlendOrAdditive,
                );
                if color_response.changed() {
                    self.model.pick_background(self.bg_color_picked);
                }
                if self.model.background_pending() {
                    ui.add(Spinner::new());
                }
            });

            let (rect, _) = ui.allocate_exact_size(Self::SWATCH_SIZE, Sense::hover());
            ui.painter()
                .rect_filled(rect, 4.0, self.model.applied_background());
        });

        // Wake up again when the next settle is due, even without input.
        if let Some(wait) = self.model.next_wake() {
            ctx.request_repaint_after(wait);
        }
    }
}
