use eframe::egui;
use kiosk_shade::gui::ShadeApp;
use kiosk_shade::logging;
use kiosk_shade::settings::{Settings, SETTINGS_FILE};
use kiosk_shade::system::SettingsService;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let settings = Settings::load(SETTINGS_FILE)?;
    logging::init(
        settings.debug_logging,
        settings.log_file.as_ref().map(PathBuf::from),
    );
    tracing::info!("starting kiosk shade");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_fullscreen(true)
            .with_decorations(false),
        ..Default::default()
    };

    let app = ShadeApp::new(&settings, SettingsService::spawn());
    eframe::run_native(
        "kiosk_shade",
        native_options,
        Box::new(move |_cc| Box::new(app)),
    )
    .map_err(|err| anyhow::anyhow!("failed to run kiosk shade: {err}"))?;
    Ok(())
}
