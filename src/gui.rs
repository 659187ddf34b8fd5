use crate::apps::{self, QuickApp};
use crate::settings::Settings;
use crate::shade::ShadeController;
use crate::system::SettingsService;
use eframe::egui;
use std::time::Instant;

pub struct ShadeApp {
    controller: ShadeController,
    quick_apps: Vec<QuickApp>,
    panel_height: f32,
}

impl ShadeApp {
    pub fn new(settings: &Settings, service: SettingsService) -> Self {
        Self {
            controller: ShadeController::new(
                settings.swipe_config(),
                settings.dismiss_timeout(),
                service,
            ),
            quick_apps: settings.quick_apps.clone(),
            panel_height: settings.max_overlay_height,
        }
    }

    /// Translate egui's input stream into recognizer calls. Touchscreens
    /// also synthesize pointer events for the same contact; the tracker's
    /// armed guard makes the duplicate feed harmless.
    fn feed_input(&mut self, ctx: &egui::Context, now: Instant) {
        if ctx.input(|i| i.key_pressed(egui::Key::F10)) && !self.controller.apps_open() {
            if self.controller.is_open() {
                self.controller.dismiss(now);
            } else {
                self.controller.show(now);
            }
        }

        // A pointer captured by a widget (slider drag) must not also move
        // the panel. Releases always go through, otherwise a gesture armed
        // just before a widget grabbed the pointer would stay armed.
        let widget_owns_pointer = ctx.is_using_pointer();

        let events = ctx.input(|i| i.events.clone());
        for event in &events {
            match event {
                egui::Event::Touch { phase, pos, .. } => match phase {
                    egui::TouchPhase::Start if !widget_owns_pointer => {
                        self.controller.touch_start(pos.y, now)
                    }
                    egui::TouchPhase::Move if !widget_owns_pointer => {
                        self.controller.touch_move(pos.y, now)
                    }
                    egui::TouchPhase::End | egui::TouchPhase::Cancel => {
                        self.controller.touch_end(now)
                    }
                    _ => {}
                },
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed,
                    ..
                } => {
                    if *pressed {
                        if !widget_owns_pointer {
                            self.controller.touch_start(pos.y, now);
                        }
                    } else {
                        self.controller.touch_end(now);
                    }
                }
                egui::Event::PointerMoved(pos) if !widget_owns_pointer => {
                    self.controller.touch_move(pos.y, now);
                }
                _ => {}
            }
        }
    }

    fn draw_shade(&mut self, ctx: &egui::Context, now: Instant) {
        let progress = self.controller.visual_progress(now);
        if progress <= 0.0 {
            return;
        }
        let screen = ctx.screen_rect();
        let panel_height = self.panel_height;
        let controller = &mut self.controller;

        // Backdrop dims the idle surface and catches taps next to the panel.
        let backdrop = egui::Area::new(egui::Id::new("shade_backdrop"))
            .order(egui::Order::Middle)
            .fixed_pos(screen.min)
            .show(ctx, |ui| {
                let response = ui.allocate_response(screen.size(), egui::Sense::click());
                let alpha = (progress * 120.0) as u8;
                ui.painter()
                    .rect_filled(screen, 0.0, egui::Color32::from_black_alpha(alpha));
                response
            });
        if backdrop.inner.clicked() && !controller.is_dragging() {
            controller.dismiss(now);
        }

        let offset = (progress - 1.0) * panel_height;
        egui::Area::new(egui::Id::new("shade_panel"))
            .order(egui::Order::Foreground)
            .fixed_pos(egui::pos2(0.0, offset))
            .show(ctx, |ui| {
                egui::Frame::default()
                    .fill(egui::Color32::from_rgb(28, 28, 34))
                    .rounding(egui::Rounding {
                        sw: 12.0,
                        se: 12.0,
                        ..Default::default()
                    })
                    .inner_margin(egui::Margin::symmetric(24.0, 16.0))
                    .show(ui, |ui| {
                        ui.set_width(screen.width() - 48.0);
                        ui.set_height(panel_height - 32.0);
                        ui.spacing_mut().slider_width = screen.width() * 0.6;

                        let mut brightness = controller.brightness();
                        ui.horizontal(|ui| {
                            ui.label(egui::RichText::new("☀").size(22.0));
                            let response = ui
                                .add(egui::Slider::new(&mut brightness, 5..=100).show_value(false));
                            if response.is_pointer_button_down_on() {
                                controller.note_interaction(now);
                            }
                            if response.changed() {
                                controller.set_brightness(brightness, now);
                            }
                        });

                        let mut volume = controller.volume();
                        ui.horizontal(|ui| {
                            ui.label(egui::RichText::new("🔊").size(22.0));
                            let response =
                                ui.add(egui::Slider::new(&mut volume, 0..=100).show_value(false));
                            if response.is_pointer_button_down_on() {
                                controller.note_interaction(now);
                            }
                            if response.changed() {
                                controller.set_volume(volume, now);
                            }
                        });

                        ui.add_space(8.0);
                        if ui.button(egui::RichText::new("⊞  Apps").size(16.0)).clicked() {
                            controller.open_apps(now);
                        }
                    });
            });
    }

    fn draw_apps(&mut self, ctx: &egui::Context, now: Instant) {
        let screen = ctx.screen_rect();
        let mut close = false;
        egui::Area::new(egui::Id::new("apps_screen"))
            .order(egui::Order::Foreground)
            .fixed_pos(screen.min)
            .show(ctx, |ui| {
                egui::Frame::default()
                    .fill(egui::Color32::from_rgb(12, 12, 16))
                    .inner_margin(24.0)
                    .show(ui, |ui| {
                        ui.set_width(screen.width() - 48.0);
                        ui.set_height(screen.height() - 48.0);
                        ui.horizontal(|ui| {
                            ui.heading("Apps");
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    if ui.button("✕  Close").clicked() {
                                        close = true;
                                    }
                                },
                            );
                        });
                        ui.add_space(16.0);
                        if self.quick_apps.is_empty() {
                            ui.label("No apps configured");
                        } else {
                            ui.horizontal_wrapped(|ui| {
                                for app in &self.quick_apps {
                                    let button =
                                        ui.add_sized([160.0, 90.0], egui::Button::new(&app.label));
                                    if button.clicked() {
                                        if let Err(err) = apps::launch(app) {
                                            tracing::error!(
                                                ?err,
                                                app = %app.label,
                                                "failed to launch quick app"
                                            );
                                        }
                                    }
                                }
                            });
                        }
                    });
            });
        if close {
            self.controller.close_apps(now);
        }
    }
}

impl eframe::App for ShadeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.feed_input(ctx, now);
        self.controller.tick(now);

        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(egui::Color32::from_rgb(12, 12, 16)))
            .show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        egui::RichText::new("Swipe down from the top for settings")
                            .color(egui::Color32::from_gray(90)),
                    );
                });
            });

        if self.controller.apps_open() {
            self.draw_apps(ctx, now);
        } else {
            self.draw_shade(ctx, now);
        }

        match self.controller.repaint_hint(now) {
            Some(delay) if delay.is_zero() => ctx.request_repaint(),
            Some(delay) => ctx.request_repaint_after(delay),
            None => {}
        }
    }
}
