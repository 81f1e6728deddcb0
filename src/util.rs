use std::f32::consts::{PI, TAU};

use eframe::egui::{Vec2, vec2};

const GOLDEN_RATIO_CONJUGATE: f32 = 0.618_034;
const SILVER_RATIO_CONJUGATE: f32 = 0.414_214;
const INITIAL_RADIUS_STEP: f32 = 30.0;

/// Shortens long labels to `max_chars`, keeping the first `max_chars - 3`
/// characters followed by an ellipsis.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_owned();
    }

    let keep = max_chars.saturating_sub(3);
    let mut short = label.chars().take(keep).collect::<String>();
    short.push_str("...");
    short
}

/// Phyllotaxis spiral offset for the node at `index`, used for initial
/// placement so no two nodes start on the same point.
pub fn phyllotaxis(index: usize) -> Vec2 {
    let radius = INITIAL_RADIUS_STEP * (0.5 + index as f32).sqrt();
    let angle = index as f32 * PI * (3.0 - 5.0_f32.sqrt());
    vec2(radius * angle.cos(), radius * angle.sin())
}

/// Deterministic unit direction for two coincident points.
pub fn jiggle(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * GOLDEN_RATIO_CONJUGATE + (to as f32) * SILVER_RATIO_CONJUGATE)
        * TAU;
    vec2(angle.cos(), angle.sin())
}

pub fn is_finite(value: Vec2) -> bool {
    value.x.is_finite() && value.y.is_finite()
}
