mod app;
mod collab;
mod editor;
mod error;
mod model;
mod playback;

fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("matchdraw=info".parse()?),
        )
        .init();

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "matchdraw",
        native_options,
        Box::new(|cc| Ok(Box::new(app::EditorApp::new(cc)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
