use eframe::egui;

pub(super) fn draw_help_window(ctx: &egui::Context, open: &mut bool) {
    egui::Window::new("Help")
        .open(open)
        .resizable(true)
        .default_width(520.0)
        .default_height(440.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Keyboard Shortcuts");
                ui.separator();

                ui.label("General");
                help_row(ui, "⌘O", "Open background image");
                help_row(ui, "⌘S", "Save test");
                help_row(ui, "⌘⇧S", "Save as new test");
                help_row(ui, "⌘Z", "Undo");
                help_row(ui, "⌘⇧Z / ⌘Y", "Redo");
                help_row(ui, "F1", "This window");

                ui.add_space(10.0);
                ui.label("Editing");
                help_row(ui, "C", "Create mode");
                help_row(ui, "E", "Edit mode");
                help_row(ui, "A", "Arrow mode");
                help_row(ui, "Delete / Backspace", "Delete the selected block or arrow");
                help_row(ui, "Escape", "Cancel and deselect");

                ui.add_space(20.0);
                ui.heading("Modes");
                ui.separator();
                ui.label("• Create: click the image for a default block, or drag to size one.");
                ui.label("• Edit: drag a block to move it, drag its edges or corners to resize.");
                ui.label("• Arrow: drag from near a block center; the arrow starts on the nearest block.");
                ui.label("• Releasing outside the canvas cancels a block or arrow in progress.");

                ui.add_space(20.0);
                ui.heading("Settings");
                ui.separator();
                ui.label("Settings are read from ~/.config/matchdraw.toml or ./settings.toml:");
                ui.add_space(5.0);
                ui.code(r##"store_dir = "tests"
assets_dir = "assets"

[editor]
snap_radius = 60.0
min_block_size = 20.0"##);

                ui.add_space(20.0);
                ui.heading("Saving");
                ui.separator();
                ui.label("• Every block needs a word before the test can be saved.");
                ui.label("• Tests are stored as test-<id>.json in the store directory.");
                ui.label("• Block positions are saved relative to the image, so any window size works.");
            });
        });
}

fn help_row(ui: &mut egui::Ui, shortcut: &str, description: &str) {
    ui.horizontal(|ui| {
        ui.add_sized([130.0, 16.0], egui::Label::new(
            egui::RichText::new(shortcut).monospace().strong()
        ));
        ui.label(description);
    });
}
