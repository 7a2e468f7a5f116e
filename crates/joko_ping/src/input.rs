use egui::Pos2;
use serde::{Deserialize, Serialize};

/// The input of one frame, as read from the host's ui toolkit.
/// `*_pressed`/`*_released` are edges of this frame, `*_down` is the current level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PingInput {
    /// seconds. must never go backwards
    pub time: f64,
    /// None when the pointer left the window
    pub pointer: Option<Pos2>,
    pub primary_down: bool,
    pub primary_pressed: bool,
    pub primary_released: bool,
    pub secondary_clicked: bool,
    pub escape_pressed: bool,
    /// names of keys held down
    pub keys_down: Vec<String>,
    /// names of keys that went down this frame
    pub keys_pressed: Vec<String>,
    /// a text field of the host wants the keyboard
    pub text_input_active: bool,
}

impl PingInput {
    pub fn key_down(&self, name: &str) -> bool {
        self.keys_down.iter().any(|k| k.eq_ignore_ascii_case(name))
    }
    pub fn key_pressed(&self, name: &str) -> bool {
        self.keys_pressed.iter().any(|k| k.eq_ignore_ascii_case(name))
    }
    /// egui's view of the same frame
    pub fn from_egui(etx: &egui::Context) -> Self {
        let text_input_active = etx.wants_keyboard_input();
        etx.input(|i| {
            let mut keys_down: Vec<String> = i.keys_down.iter().map(|k| k.name().to_owned()).collect();
            keys_down.sort();
            let keys_pressed = i
                .events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        repeat: false,
                        ..
                    } => Some(key.name().to_owned()),
                    _ => None,
                })
                .collect();
            Self {
                time: i.time,
                pointer: i.pointer.hover_pos(),
                primary_down: i.pointer.primary_down(),
                primary_pressed: i.pointer.primary_pressed(),
                primary_released: i.pointer.primary_released(),
                secondary_clicked: i.pointer.secondary_clicked(),
                escape_pressed: i.key_pressed(egui::Key::Escape),
                keys_down,
                keys_pressed,
                text_input_active,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_ignore_case() {
        let input = PingInput {
            keys_down: vec!["Tab".to_owned()],
            keys_pressed: vec!["F".to_owned()],
            ..Default::default()
        };
        assert!(input.key_down("tab"));
        assert!(!input.key_down("F"));
        assert!(input.key_pressed("f"));
    }

    fn run_frame(etx: &egui::Context, time: f64, events: Vec<egui::Event>) -> PingInput {
        let raw_input = egui::RawInput {
            time: Some(time),
            events,
            ..Default::default()
        };
        let mut input = PingInput::default();
        let _ = etx.run(raw_input, |etx| {
            input = PingInput::from_egui(etx);
        });
        input
    }

    #[test]
    fn reads_egui_input_without_key_repeats() {
        let etx = egui::Context::default();
        let pos = egui::pos2(100.0, 120.0);
        let tab = |repeat| egui::Event::Key {
            key: egui::Key::Tab,
            pressed: true,
            repeat,
            modifiers: egui::Modifiers::NONE,
        };

        let first = run_frame(
            &etx,
            1.0,
            vec![
                egui::Event::PointerMoved(pos),
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed: true,
                    modifiers: egui::Modifiers::NONE,
                },
                tab(false),
            ],
        );
        assert_eq!(first.time, 1.0);
        assert_eq!(first.pointer, Some(pos));
        assert!(first.primary_pressed);
        assert!(first.primary_down);
        assert!(!first.text_input_active);
        assert!(first.key_pressed("Tab"));
        assert!(first.key_down("Tab"));

        // holding the key only produces repeats, which must not read as a fresh press
        let held = run_frame(&etx, 1.1, vec![tab(true)]);
        assert!(held.keys_pressed.is_empty());
        assert!(held.key_down("Tab"));
        assert!(!held.primary_pressed);
        assert!(held.primary_down);
    }
}
