//! Quick-add key combination.
//!
//! Key events are pushed into a queue by whoever captures them: the
//! system-wide shortcut in [`global`], or the window's own keyboard input when
//! that cannot be registered. A dedicated thread drains the queue and runs the
//! callback each time the configured combination is completed.
//! `stop` joins that thread, so no callback runs once it returns.

pub mod global;

use crate::error::{NiftyError, Result};
pub use global::GlobalShortcut;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
    Super,
}

impl Modifier {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "ctrl" | "control" => Some(Modifier::Ctrl),
            "shift" => Some(Modifier::Shift),
            "alt" | "option" => Some(Modifier::Alt),
            "cmd" | "super" | "meta" | "win" => Some(Modifier::Super),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Modifier::Ctrl => "ctrl",
            Modifier::Shift => "shift",
            Modifier::Alt => "alt",
            Modifier::Super => "cmd",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Modifier(Modifier),
    Char(char),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyEvent {
    Pressed(Key),
    Released(Key),
}

/// Modifiers plus one trigger key, e.g. `<ctrl>+<shift>+s`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyCombo {
    modifiers: BTreeSet<Modifier>,
    key: char,
}

impl KeyCombo {
    pub fn new(modifiers: impl IntoIterator<Item = Modifier>, key: char) -> Self {
        Self {
            modifiers: modifiers.into_iter().collect(),
            key: key.to_ascii_lowercase(),
        }
    }

    pub fn modifiers(&self) -> &BTreeSet<Modifier> {
        &self.modifiers
    }

    pub fn key(&self) -> char {
        self.key
    }
}

impl FromStr for KeyCombo {
    type Err = NiftyError;

    fn from_str(s: &str) -> Result<Self> {
        let mut modifiers = BTreeSet::new();
        let mut key = None;

        for raw in s.split('+') {
            let token = raw
                .trim()
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_ascii_lowercase();
            if token.is_empty() {
                return Err(NiftyError::hotkey(format!("empty key in '{}'", s)));
            }

            if let Some(modifier) = Modifier::parse(&token) {
                modifiers.insert(modifier);
                continue;
            }

            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if key.is_none() => key = Some(c),
                (Some(_), None) => {
                    return Err(NiftyError::hotkey(format!("more than one key in '{}'", s)));
                }
                _ => return Err(NiftyError::hotkey(format!("unknown key '{}'", raw.trim()))),
            }
        }

        let key = key.ok_or_else(|| NiftyError::hotkey(format!("no trigger key in '{}'", s)))?;
        Ok(Self { modifiers, key })
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "<{}>+", modifier.name())?;
        }
        write!(f, "{}", self.key)
    }
}

/// Tracks held keys and reports when the combination is completed.
#[derive(Debug)]
struct ComboTracker {
    combo: KeyCombo,
    held: BTreeSet<Modifier>,
    key_down: bool,
}

impl ComboTracker {
    fn new(combo: KeyCombo) -> Self {
        Self {
            combo,
            held: BTreeSet::new(),
            key_down: false,
        }
    }

    /// Returns true when this event completes the combination.
    fn handle(&mut self, event: KeyEvent) -> bool {
        match event {
            KeyEvent::Pressed(Key::Modifier(m)) => {
                self.held.insert(m);
                false
            }
            KeyEvent::Released(Key::Modifier(m)) => {
                self.held.remove(&m);
                false
            }
            KeyEvent::Pressed(Key::Char(c)) => {
                if c.to_ascii_lowercase() != self.combo.key || self.key_down {
                    return false;
                }
                self.key_down = true;
                self.held == self.combo.modifiers
            }
            KeyEvent::Released(Key::Char(c)) => {
                if c.to_ascii_lowercase() == self.combo.key {
                    self.key_down = false;
                }
                false
            }
        }
    }
}

enum Message {
    Key(KeyEvent),
    Stop,
}

/// Cloneable handle for pushing key events to a running listener.
#[derive(Clone)]
pub struct KeyFeed {
    tx: Sender<Message>,
}

impl KeyFeed {
    /// Returns false once the listener has stopped.
    pub fn send(&self, event: KeyEvent) -> bool {
        self.tx.send(Message::Key(event)).is_ok()
    }
}

pub struct HotkeyListener {
    combo: KeyCombo,
    tx: Sender<Message>,
    handle: Option<JoinHandle<()>>,
}

impl HotkeyListener {
    /// Spawns the listener thread. `on_trigger` runs on that thread.
    pub fn start<F>(combo: KeyCombo, on_trigger: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let tracker = ComboTracker::new(combo.clone());

        let handle = thread::Builder::new()
            .name("nifty-hotkey".to_string())
            .spawn(move || listen(rx, tracker, on_trigger))
            .map_err(|e| NiftyError::hotkey(format!("failed to start listener: {}", e)))?;

        log::info!("Listening for {}", combo);
        Ok(Self {
            combo,
            tx,
            handle: Some(handle),
        })
    }

    pub fn combo(&self) -> &KeyCombo {
        &self.combo
    }

    pub fn feed(&self) -> KeyFeed {
        KeyFeed {
            tx: self.tx.clone(),
        }
    }

    /// Stops the listener and waits for its thread to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let _ = self.tx.send(Message::Stop);
        if handle.join().is_err() {
            log::error!("Hotkey listener thread panicked");
        } else {
            log::info!("Stopped listening for {}", self.combo);
        }
    }
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn listen<F>(rx: Receiver<Message>, mut tracker: ComboTracker, mut on_trigger: F)
where
    F: FnMut(),
{
    while let Ok(Message::Key(event)) = rx.recv() {
        if tracker.handle(event) {
            log::debug!("Hotkey {} triggered", tracker.combo);
            on_trigger();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn press_combo(feed: &KeyFeed) {
        feed.send(KeyEvent::Pressed(Key::Modifier(Modifier::Ctrl)));
        feed.send(KeyEvent::Pressed(Key::Modifier(Modifier::Shift)));
        feed.send(KeyEvent::Pressed(Key::Char('s')));
        feed.send(KeyEvent::Released(Key::Char('s')));
        feed.send(KeyEvent::Released(Key::Modifier(Modifier::Shift)));
        feed.send(KeyEvent::Released(Key::Modifier(Modifier::Ctrl)));
    }

    #[test]
    fn test_parse_angle_bracket_format() {
        let combo: KeyCombo = "<ctrl>+<shift>+s".parse().unwrap();
        assert_eq!(combo, KeyCombo::new([Modifier::Ctrl, Modifier::Shift], 's'));
        assert_eq!(combo.to_string(), "<ctrl>+<shift>+s");
    }

    #[test]
    fn test_parse_bare_format_and_aliases() {
        let combo: KeyCombo = "Control + Option + K".parse().unwrap();
        assert_eq!(combo.key(), 'k');
        assert!(combo.modifiers().contains(&Modifier::Ctrl));
        assert!(combo.modifiers().contains(&Modifier::Alt));
    }

    #[test]
    fn test_parse_rejects_bad_combos() {
        assert!("<ctrl>+<shift>".parse::<KeyCombo>().is_err());
        assert!("ctrl+a+b".parse::<KeyCombo>().is_err());
        assert!("ctrl++s".parse::<KeyCombo>().is_err());
        assert!("<hyper>+s".parse::<KeyCombo>().is_err());
    }

    #[test]
    fn test_tracker_fires_once_per_press() {
        let mut tracker = ComboTracker::new(KeyCombo::new([Modifier::Ctrl], 'q'));

        assert!(!tracker.handle(KeyEvent::Pressed(Key::Char('q'))));
        assert!(!tracker.handle(KeyEvent::Released(Key::Char('q'))));

        assert!(!tracker.handle(KeyEvent::Pressed(Key::Modifier(Modifier::Ctrl))));
        assert!(tracker.handle(KeyEvent::Pressed(Key::Char('Q'))));
        // key repeat while held does not fire again
        assert!(!tracker.handle(KeyEvent::Pressed(Key::Char('q'))));
        assert!(!tracker.handle(KeyEvent::Released(Key::Char('q'))));
        assert!(tracker.handle(KeyEvent::Pressed(Key::Char('q'))));
    }

    #[test]
    fn test_tracker_requires_exact_modifiers() {
        let mut tracker = ComboTracker::new(KeyCombo::new([Modifier::Ctrl], 'q'));
        tracker.handle(KeyEvent::Pressed(Key::Modifier(Modifier::Ctrl)));
        tracker.handle(KeyEvent::Pressed(Key::Modifier(Modifier::Alt)));

        assert!(!tracker.handle(KeyEvent::Pressed(Key::Char('q'))));
    }

    #[test]
    fn test_listener_runs_callback_on_combo() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let listener = HotkeyListener::start("<ctrl>+<shift>+s".parse().unwrap(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        let feed = listener.feed();
        press_combo(&feed);
        press_combo(&feed);
        listener.stop();

        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_no_delivery_after_stop() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let listener = HotkeyListener::start("<ctrl>+<shift>+s".parse().unwrap(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        let feed = listener.feed();
        listener.stop();

        assert!(!feed.send(KeyEvent::Pressed(Key::Modifier(Modifier::Ctrl))));
        press_combo(&feed);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
