//! Desktop shell: review, add and statistics tabs plus the quick-add window.
//! All scheduling decisions live in the library; this file only wires widgets to it.

use chrono::{DateTime, Local, Utc};
use eframe::egui;
use nifty_app::ItemStore;
use nifty_app::hotkey::{GlobalShortcut, HotkeyListener, Key, KeyCombo, KeyEvent, KeyFeed, Modifier};
use nifty_app::models::{RateOutcome, Rating, ReviewSession, ReviewStats, StatsAggregator};
use std::sync::mpsc::{self, Receiver};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum Tab {
    #[default]
    Review,
    AddItem,
    Statistics,
}

/// Deferred UI actions, applied after rendering to avoid borrowing conflicts.
enum Action {
    StartReview,
    Rate(Rating),
    AddItem(String),
    QuickAdd(String),
    CloseQuickAdd,
}

/// egui modifier flags paired with the listener's modifier keys.
const MODIFIER_FLAGS: [(Modifier, fn(&egui::Modifiers) -> bool); 4] = [
    (Modifier::Ctrl, |m| m.ctrl),
    (Modifier::Shift, |m| m.shift),
    (Modifier::Alt, |m| m.alt),
    (Modifier::Super, |m| m.mac_cmd),
];

pub struct NiftyApp {
    store: Option<ItemStore>,
    session: ReviewSession,
    hotkey: Option<HotkeyListener>,
    global_shortcut: Option<GlobalShortcut>,
    /// Window key input is forwarded only when the global shortcut is unavailable.
    key_feed: Option<KeyFeed>,
    quick_add_rx: Receiver<()>,
    last_modifiers: egui::Modifiers,

    tab: Tab,
    review_message: String,
    new_content: String,
    add_message: String,
    stats: ReviewStats,
    stats_error: Option<String>,

    show_quick_add: bool,
    quick_add_content: String,

    show_confirmation_dialog: bool,
    allowed_to_close: bool,
}

/// Formats a UTC timestamp as a local YYYY-MM-DD string.
fn format_date(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

fn key_char(key: egui::Key) -> Option<char> {
    let mut chars = key.name().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}

impl NiftyApp {
    pub fn new(cc: &eframe::CreationContext<'_>, store: ItemStore, combo: KeyCombo) -> Self {
        let (quick_add_tx, quick_add_rx) = mpsc::channel();
        let ctx = cc.egui_ctx.clone();

        let hotkey = match HotkeyListener::start(combo.clone(), move || {
            if quick_add_tx.send(()).is_ok() {
                ctx.request_repaint();
            }
        }) {
            Ok(listener) => Some(listener),
            Err(e) => {
                log::warn!("Quick add shortcut unavailable: {}", e);
                None
            }
        };

        let mut global_shortcut = None;
        let mut key_feed = None;
        if let Some(listener) = &hotkey {
            match GlobalShortcut::register(&combo, listener.feed()) {
                Ok(shortcut) => global_shortcut = Some(shortcut),
                Err(e) => {
                    log::warn!("{}; {} only works while the window has focus", e, combo);
                    key_feed = Some(listener.feed());
                }
            }
        }

        let mut app = Self {
            store: Some(store),
            session: ReviewSession::new(),
            hotkey,
            global_shortcut,
            key_feed,
            quick_add_rx,
            last_modifiers: egui::Modifiers::NONE,
            tab: Tab::Review,
            review_message: "Click 'Start Review' to begin".to_string(),
            new_content: String::new(),
            add_message: String::new(),
            stats: ReviewStats::default(),
            stats_error: None,
            show_quick_add: false,
            quick_add_content: String::new(),
            show_confirmation_dialog: false,
            allowed_to_close: false,
        };
        app.refresh_stats();
        app
    }

    /// Stops the shortcut listener and closes the store. Safe to call more than once.
    fn shutdown(&mut self) {
        self.global_shortcut = None;
        self.key_feed = None;
        if let Some(listener) = self.hotkey.take() {
            listener.stop();
        }
        if let Some(store) = self.store.take() {
            if let Err(e) = store.close() {
                log::error!("Failed to close item store: {}", e);
            }
        }
    }

    fn refresh_stats(&mut self) {
        let Some(store) = &self.store else { return };
        match StatsAggregator::new(store).get_stats() {
            Ok(stats) => {
                self.stats = stats;
                self.stats_error = None;
            }
            Err(e) => {
                log::warn!("Failed to load statistics: {}", e);
                self.stats_error = Some(e.to_string());
            }
        }
    }

    /// Pushes window keyboard input to the shortcut listener.
    fn forward_keys(&mut self, ctx: &egui::Context) {
        let Some(feed) = &self.key_feed else { return };
        let events = ctx.input(|i| i.events.clone());

        for event in events {
            let egui::Event::Key {
                key,
                pressed,
                modifiers,
                ..
            } = event
            else {
                continue;
            };

            for (modifier, is_down) in MODIFIER_FLAGS {
                let was = is_down(&self.last_modifiers);
                let now = is_down(&modifiers);
                if now && !was {
                    feed.send(KeyEvent::Pressed(Key::Modifier(modifier)));
                } else if was && !now {
                    feed.send(KeyEvent::Released(Key::Modifier(modifier)));
                }
            }
            self.last_modifiers = modifiers;

            if let Some(c) = key_char(key) {
                let event = if pressed {
                    KeyEvent::Pressed(Key::Char(c))
                } else {
                    KeyEvent::Released(Key::Char(c))
                };
                feed.send(event);
            }
        }
    }

    fn apply(&mut self, action: Action) {
        let Some(store) = &self.store else { return };

        match action {
            Action::StartReview => match self.session.start_review(store) {
                Ok(Some(item)) => self.review_message = item.content.clone(),
                Ok(None) => self.review_message = "No items due for review!".to_string(),
                Err(e) => {
                    log::error!("Failed to fetch due item: {}", e);
                    self.review_message = format!("Could not load the next item: {}", e);
                }
            },
            Action::Rate(rating) => match self.session.rate(store, rating) {
                Ok(RateOutcome::Rated {
                    interval_days,
                    has_next,
                    next_error,
                    ..
                }) => {
                    let next = store.now() + chrono::Duration::days(i64::from(interval_days));
                    log::info!("Rated {}: next review {}", rating, format_date(next));
                    self.review_message = match (self.session.current_item(), next_error) {
                        (_, Some(e)) => format!(
                            "Rating saved, next review {}. Could not load the next item: {}",
                            format_date(next),
                            e
                        ),
                        (Some(item), None) if has_next => item.content.clone(),
                        _ => "No items due for review!".to_string(),
                    };
                }
                Ok(RateOutcome::NothingHeld) => {}
                Err(e) => {
                    log::error!("Failed to record rating: {}", e);
                    self.review_message = format!("Could not save the rating: {}", e);
                }
            },
            Action::AddItem(content) => {
                let content = content.trim();
                if content.is_empty() {
                    self.add_message = "Please enter some content!".to_string();
                    return;
                }
                match store.add_item(content) {
                    Ok(_) => {
                        self.new_content.clear();
                        self.add_message = "Item added successfully!".to_string();
                    }
                    Err(e) => {
                        log::error!("Failed to add item: {}", e);
                        self.add_message = format!("Could not add the item: {}", e);
                    }
                }
            }
            Action::QuickAdd(content) => {
                let content = content.trim();
                if !content.is_empty() {
                    if let Err(e) = store.add_item(content) {
                        log::error!("Quick add failed: {}", e);
                    }
                }
                self.quick_add_content.clear();
                self.show_quick_add = false;
            }
            Action::CloseQuickAdd => {
                self.quick_add_content.clear();
                self.show_quick_add = false;
            }
        }

        self.refresh_stats();
    }

    fn render_tabs(&mut self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.tab, Tab::Review, "Review");
                ui.selectable_value(&mut self.tab, Tab::AddItem, "Add Item");
                ui.selectable_value(&mut self.tab, Tab::Statistics, "Statistics");
            });
            ui.separator();

            match self.tab {
                Tab::Review => {
                    ui.vertical_centered(|ui| {
                        ui.add_space(20.0);
                        ui.label(&self.review_message);
                        ui.add_space(20.0);

                        if ui.button("Start Review").clicked() {
                            actions.push(Action::StartReview);
                        }

                        // Rating buttons only while an item is presented
                        if self.session.is_presenting() {
                            ui.horizontal(|ui| {
                                for rating in Rating::ALL {
                                    if ui.button(rating.as_str()).clicked() {
                                        actions.push(Action::Rate(rating));
                                    }
                                }
                            });
                        }

                        if self.session.reviewed_count() > 0 {
                            ui.add_space(10.0);
                            ui.label(format!(
                                "Reviewed this session: {}",
                                self.session.reviewed_count()
                            ));
                        }
                    });
                }
                Tab::AddItem => {
                    ui.label("Add New Item to Learn:");
                    ui.text_edit_multiline(&mut self.new_content);
                    if ui.button("Add Item").clicked() {
                        actions.push(Action::AddItem(self.new_content.clone()));
                    }
                    if !self.add_message.is_empty() {
                        ui.label(&self.add_message);
                    }
                }
                Tab::Statistics => {
                    ui.vertical_centered(|ui| {
                        ui.heading("Statistics:");
                        match &self.stats_error {
                            Some(e) => ui.label(format!("Statistics unavailable: {}", e)),
                            None => ui.label(self.stats.to_string()),
                        };
                    });
                }
            }
        });
    }

    fn render_quick_add(&mut self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        egui::Window::new("Quick Add")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("Enter item to learn:");
                let response = ui.text_edit_multiline(&mut self.quick_add_content);
                response.request_focus();

                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        actions.push(Action::QuickAdd(self.quick_add_content.clone()));
                    }
                    if ui.button("Cancel").clicked() {
                        actions.push(Action::CloseQuickAdd);
                    }
                });
            });
    }
}

impl eframe::App for NiftyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.forward_keys(ctx);
        while self.quick_add_rx.try_recv().is_ok() {
            self.show_quick_add = true;
        }

        let mut actions = Vec::new();
        self.render_tabs(ctx, &mut actions);
        if self.show_quick_add {
            self.render_quick_add(ctx, &mut actions);
        }
        for action in actions {
            self.apply(action);
        }

        // Handle window close requests with confirmation dialog
        if ctx.input(|i| i.viewport().close_requested()) && !self.allowed_to_close {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.show_confirmation_dialog = true;
        }

        if self.show_confirmation_dialog {
            egui::Window::new("Do you want to quit?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = false;
                        }

                        if ui.button("Yes").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = true;
                            self.shutdown();
                            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                });
        }
    }
}

impl Drop for NiftyApp {
    fn drop(&mut self) {
        self.shutdown();
    }
}
