use egui::{Pos2, Rect};
use serde::{Deserialize, Serialize};

/// A visible ui window/panel of the host, in screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub name: String,
    pub rect: Rect,
    /// see-through panels never hide anything
    #[serde(default = "default_opaque")]
    pub opaque: bool,
}

fn default_opaque() -> bool {
    true
}

impl Panel {
    pub fn new(name: impl Into<String>, rect: Rect) -> Self {
        Self {
            name: name.into(),
            rect,
            opaque: true,
        }
    }
}

/// The first opaque panel containing `point` whose name isn't in `allow_list`.
/// Allow listed panels are hud chrome that is always on screen and would hide everything otherwise.
pub fn covering_panel<'a>(panels: &'a [Panel], point: Pos2, allow_list: &[String]) -> Option<&'a Panel> {
    panels.iter().find(|panel| {
        panel.opaque
            && panel.rect.contains(point)
            && !allow_list.iter().any(|allowed| allowed == &panel.name)
    })
}
