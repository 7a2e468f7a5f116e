use egui::{Align2, Color32, FontId, Pos2, Rect, Shape, Stroke, TextureId};

/// A single thing to paint on the overlay. Screen space, in points.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Image {
        texture: TextureId,
        rect: Rect,
        /// the frame of the sprite sheet
        uv: Rect,
        tint: Color32,
    },
    /// text centered on `pos`
    Text {
        pos: Pos2,
        text: String,
        size: f32,
        color: Color32,
    },
    RectFilled {
        rect: Rect,
        rounding: f32,
        color: Color32,
    },
    Circle {
        center: Pos2,
        radius: f32,
        /// zero stroke width means filled
        stroke_width: f32,
        color: Color32,
    },
    /// partial circle starting at the top, going clockwise. `fraction` in 0..=1
    Arc {
        center: Pos2,
        radius: f32,
        fraction: f32,
        stroke_width: f32,
        color: Color32,
    },
}

impl DrawCommand {
    const ARC_SEGMENTS: usize = 48;

    pub fn paint(&self, painter: &egui::Painter) {
        match self {
            DrawCommand::Image {
                texture,
                rect,
                uv,
                tint,
            } => {
                painter.image(*texture, *rect, *uv, *tint);
            }
            DrawCommand::Text {
                pos,
                text,
                size,
                color,
            } => {
                painter.text(
                    *pos,
                    Align2::CENTER_CENTER,
                    text,
                    FontId::proportional(*size),
                    *color,
                );
            }
            DrawCommand::RectFilled {
                rect,
                rounding,
                color,
            } => {
                painter.rect_filled(*rect, *rounding, *color);
            }
            DrawCommand::Circle {
                center,
                radius,
                stroke_width,
                color,
            } => {
                if *stroke_width <= 0.0 {
                    painter.circle_filled(*center, *radius, *color);
                } else {
                    painter.circle_stroke(*center, *radius, Stroke::new(*stroke_width, *color));
                }
            }
            DrawCommand::Arc {
                center,
                radius,
                fraction,
                stroke_width,
                color,
            } => {
                let points = arc_points(*center, *radius, *fraction, Self::ARC_SEGMENTS);
                if points.len() >= 2 {
                    painter.add(Shape::line(points, Stroke::new(*stroke_width, *color)));
                }
            }
        }
    }
}

fn arc_points(center: Pos2, radius: f32, fraction: f32, segments: usize) -> Vec<Pos2> {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let count = (segments as f32 * fraction).ceil() as usize;
    (0..=count)
        .map(|i| {
            let angle = std::f32::consts::TAU * fraction * (i as f32 / count.max(1) as f32)
                - std::f32::consts::FRAC_PI_2;
            center + egui::vec2(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// Everything a single marker draws this frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerLayer {
    pub commands: Vec<DrawCommand>,
    /// The distance from camera
    /// Markers overlap each other, so we need to paint them from far -> near order
    /// We will sort them using this distance just before painting
    pub distance: f32,
}

/// The frame's output. markers first (sorted by depth), then the overlay ui (reticle, radial menu) on top.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    pub markers: Vec<MarkerLayer>,
    pub overlay: Vec<DrawCommand>,
}

impl DrawList {
    pub fn prepare_frame(&mut self) {
        self.markers.clear();
        self.overlay.clear();
    }
    pub fn add_marker(&mut self, layer: MarkerLayer) {
        if !layer.commands.is_empty() {
            self.markers.push(layer);
        }
    }
    pub fn add_overlay(&mut self, commands: impl IntoIterator<Item = DrawCommand>) {
        self.overlay.extend(commands);
    }
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty() && self.overlay.is_empty()
    }
    /// flattened commands in paint order
    pub fn commands(&self) -> Vec<&DrawCommand> {
        let mut markers: Vec<&MarkerLayer> = self.markers.iter().collect();
        // we need the farther markers (more distance from camera) to be painted first
        markers.sort_by(|first, second| first.distance.total_cmp(&second.distance).reverse());
        markers
            .into_iter()
            .flat_map(|layer| layer.commands.iter())
            .chain(self.overlay.iter())
            .collect()
    }
    pub fn paint(&self, painter: &egui::Painter) {
        for command in self.commands() {
            command.paint(painter);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn dot(x: f32, distance: f32) -> MarkerLayer {
        MarkerLayer {
            commands: vec![DrawCommand::Circle {
                center: pos2(x, 0.0),
                radius: 1.0,
                stroke_width: 0.0,
                color: Color32::WHITE,
            }],
            distance,
        }
    }

    #[test]
    fn markers_are_painted_far_to_near_below_the_overlay() {
        let mut list = DrawList::default();
        list.add_marker(dot(1.0, 10.0));
        list.add_marker(dot(2.0, 50.0));
        list.add_marker(dot(3.0, 30.0));
        list.add_overlay([DrawCommand::Text {
            pos: pos2(0.0, 0.0),
            text: "reticle".to_owned(),
            size: 12.0,
            color: Color32::WHITE,
        }]);
        let order: Vec<f32> = list
            .commands()
            .into_iter()
            .map(|c| match c {
                DrawCommand::Circle { center, .. } => center.x,
                _ => -1.0,
            })
            .collect();
        assert_eq!(order, vec![2.0, 3.0, 1.0, -1.0]);
    }

    #[test]
    fn empty_layers_are_dropped() {
        let mut list = DrawList::default();
        list.add_marker(MarkerLayer::default());
        assert!(list.is_empty());
        list.add_marker(dot(1.0, 1.0));
        assert!(!list.is_empty());
        list.prepare_frame();
        assert!(list.is_empty());
    }

    #[test]
    fn arc_covers_the_requested_fraction() {
        let center = pos2(0.0, 0.0);
        let half = arc_points(center, 10.0, 0.5, 48);
        // starts at the top, ends at the bottom
        assert!((half[0] - pos2(0.0, -10.0)).length() < 1e-3);
        assert!((half[half.len() - 1] - pos2(0.0, 10.0)).length() < 1e-3);
        assert_eq!(arc_points(center, 10.0, f32::NAN, 48).len(), 1);
    }
}
