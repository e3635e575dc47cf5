//! System-wide registration of the quick-add combination.
//!
//! The OS reports the combination as one pressed/released pair. Each report is
//! replayed into the listener queue as the individual key events, so the same
//! tracker decides when the callback fires whether or not the window has focus.

use super::{Key, KeyCombo, KeyEvent, KeyFeed, Modifier};
use crate::error::{NiftyError, Result};
use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use std::str::FromStr;

/// A combination registered with the OS. Unregistered on drop.
pub struct GlobalShortcut {
    manager: GlobalHotKeyManager,
    hotkey: HotKey,
}

impl GlobalShortcut {
    /// Registers `combo` and forwards its presses into `feed`.
    ///
    /// Must be called on the thread that runs the window's event loop.
    pub fn register(combo: &KeyCombo, feed: KeyFeed) -> Result<Self> {
        let hotkey = to_hotkey(combo)?;
        let manager = GlobalHotKeyManager::new()
            .map_err(|e| NiftyError::hotkey(format!("global shortcuts unavailable: {}", e)))?;
        manager
            .register(hotkey)
            .map_err(|e| NiftyError::hotkey(format!("failed to register {}: {}", combo, e)))?;

        log::info!("Registered global shortcut {}", combo);

        let id = hotkey.id();
        let combo = combo.clone();
        GlobalHotKeyEvent::set_event_handler(Some(move |event: GlobalHotKeyEvent| {
            if event.id() != id {
                return;
            }
            for key_event in replay(&combo, event.state()) {
                if !feed.send(key_event) {
                    break;
                }
            }
        }));

        Ok(Self { manager, hotkey })
    }
}

impl Drop for GlobalShortcut {
    fn drop(&mut self) {
        GlobalHotKeyEvent::set_event_handler::<fn(GlobalHotKeyEvent)>(None);
        if let Err(e) = self.manager.unregister(self.hotkey) {
            log::warn!("Failed to unregister global shortcut: {}", e);
        }
    }
}

/// Maps a parsed combination to the OS-level hotkey description.
fn to_hotkey(combo: &KeyCombo) -> Result<HotKey> {
    let modifiers = combo
        .modifiers()
        .iter()
        .fold(Modifiers::empty(), |acc, modifier| {
            acc | match modifier {
                Modifier::Ctrl => Modifiers::CONTROL,
                Modifier::Shift => Modifiers::SHIFT,
                Modifier::Alt => Modifiers::ALT,
                Modifier::Super => Modifiers::SUPER,
            }
        });

    let key = combo.key();
    let code_name = if key.is_ascii_alphabetic() {
        format!("Key{}", key.to_ascii_uppercase())
    } else if key.is_ascii_digit() {
        format!("Digit{}", key)
    } else {
        return Err(NiftyError::hotkey(format!(
            "'{}' cannot be used in a global shortcut",
            key
        )));
    };
    let code = Code::from_str(&code_name)
        .map_err(|_| NiftyError::hotkey(format!("unknown key code {}", code_name)))?;

    let modifiers = (!modifiers.is_empty()).then_some(modifiers);
    Ok(HotKey::new(modifiers, code))
}

/// Key events equivalent to one OS report of the combination.
fn replay(combo: &KeyCombo, state: HotKeyState) -> Vec<KeyEvent> {
    let modifiers = combo.modifiers().iter().map(|m| Key::Modifier(*m));
    let key = Key::Char(combo.key());

    match state {
        HotKeyState::Pressed => modifiers
            .chain(std::iter::once(key))
            .map(KeyEvent::Pressed)
            .collect(),
        HotKeyState::Released => std::iter::once(key)
            .chain(modifiers)
            .map(KeyEvent::Released)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::ComboTracker;
    use super::*;

    fn quick_add_combo() -> KeyCombo {
        "<ctrl>+<shift>+s".parse().unwrap()
    }

    #[test]
    fn test_to_hotkey_matches_combo() {
        let hotkey = to_hotkey(&quick_add_combo()).unwrap();
        let expected = HotKey::new(Some(Modifiers::CONTROL | Modifiers::SHIFT), Code::KeyS);
        assert_eq!(hotkey, expected);
    }

    #[test]
    fn test_to_hotkey_digit_without_modifiers() {
        let hotkey = to_hotkey(&KeyCombo::new(Vec::<Modifier>::new(), '7')).unwrap();
        assert_eq!(hotkey, HotKey::new(None, Code::Digit7));
    }

    #[test]
    fn test_to_hotkey_rejects_punctuation() {
        let result = to_hotkey(&KeyCombo::new([Modifier::Alt], '/'));
        assert!(matches!(result, Err(NiftyError::Hotkey { .. })));
    }

    #[test]
    fn test_replayed_reports_fire_tracker_once_per_press() {
        let combo = quick_add_combo();
        let mut tracker = ComboTracker::new(combo.clone());

        let mut fired = 0;
        for _ in 0..2 {
            for state in [HotKeyState::Pressed, HotKeyState::Released] {
                fired += replay(&combo, state)
                    .into_iter()
                    .filter(|event| tracker.handle(*event))
                    .count();
            }
        }
        assert_eq!(fired, 2);
    }

    #[test]
    fn test_press_without_release_does_not_repeat() {
        let combo = quick_add_combo();
        let mut tracker = ComboTracker::new(combo.clone());

        let first: Vec<_> = replay(&combo, HotKeyState::Pressed);
        assert!(first.iter().any(|event| tracker.handle(*event)));
        let second: Vec<_> = replay(&combo, HotKeyState::Pressed);
        assert!(!second.iter().any(|event| tracker.handle(*event)));
    }
}
