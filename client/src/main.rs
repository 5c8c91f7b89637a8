#![warn(clippy::all, rust_2018_idioms)]

fn main() -> eframe::Result<()> {
    env_logger::init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([420.0, 380.0])
            .with_min_inner_size([320.0, 240.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Debounce Loader Demo",
        native_options,
        Box::new(|cc| Ok(Box::new(debounce_loader_demo::DemoApp::new(cc)))),
    )
}
