//! Hillshade paint properties for the selected shading method.

use crate::core::constants::HILLSHADE_SOURCE_ID;
use crate::surface::spec::{LayerKind, LayerSpec};
use crate::viewer::state::ViewerState;
use serde_json::{json, Map, Value};

pub const HILLSHADE_LAYER_ID: &str = "hillshade";

const LIT_METHODS: [&str; 4] = ["standard", "combined", "igor", "basic"];
const ALTITUDE_METHODS: [&str; 2] = ["combined", "basic"];
const EXAGGERATED_METHODS: [&str; 5] = [
    "standard",
    "combined",
    "multidirectional",
    "multidir-colors",
    "aspect-multidir",
];

/// Paint for a hillshade layer drawn with `state.hillshade_method`.
///
/// The multidirectional presets carry fixed light setups; every other method
/// takes its lighting from the state, with the hillshade opacity applied as
/// the alpha of shadow and highlight colors.
pub fn hillshade_paint(state: &ViewerState) -> Map<String, Value> {
    let mut paint = Map::new();
    let method = state.hillshade_method.as_str();

    match method {
        "multidirectional" => {
            paint.insert("hillshade-method".into(), json!("multidirectional"));
            paint.insert("hillshade-exaggeration".into(), json!(0.5));
        }
        "multidir-colors" => {
            paint.insert("hillshade-method".into(), json!("multidirectional"));
            paint.insert(
                "hillshade-highlight-color".into(),
                json!(["#FF4000", "#FFFF00", "#40ff00", "#00FF80"]),
            );
            paint.insert(
                "hillshade-shadow-color".into(),
                json!(["#00bfff", "#0000ff", "#bf00ff", "#FF0080"]),
            );
            paint.insert("hillshade-illumination-direction".into(), json!([270, 315, 0, 45]));
            paint.insert("hillshade-illumination-altitude".into(), json!([30, 30, 30, 30]));
        }
        "aspect-multidir" => {
            paint.insert("hillshade-method".into(), json!("multidirectional"));
            paint.insert("hillshade-highlight-color".into(), json!(["#CC0000", "#0000CC"]));
            paint.insert("hillshade-shadow-color".into(), json!(["#00CCCC", "#CCCC00"]));
            paint.insert("hillshade-illumination-direction".into(), json!([0, 270]));
            paint.insert("hillshade-illumination-altitude".into(), json!([30, 30]));
        }
        _ => {
            let lit = LIT_METHODS.contains(&method);
            if lit {
                paint.insert(
                    "hillshade-illumination-direction".into(),
                    json!(state.illumination_dir),
                );
                paint.insert(
                    "hillshade-shadow-color".into(),
                    json!(rgba(&state.shadow_color, state.hillshade_opacity)),
                );
                paint.insert(
                    "hillshade-highlight-color".into(),
                    json!(rgba(&state.highlight_color, state.hillshade_opacity)),
                );
            }
            if ALTITUDE_METHODS.contains(&method) {
                paint.insert(
                    "hillshade-illumination-altitude".into(),
                    json!(state.illumination_alt),
                );
            }
            if EXAGGERATED_METHODS.contains(&method) {
                paint.insert("hillshade-exaggeration".into(), json!(state.hillshade_exag));
            }
            if method == "standard" {
                paint.insert("hillshade-accent-color".into(), json!(state.accent_color));
            } else {
                paint.insert("hillshade-method".into(), json!(method));
            }
        }
    }

    paint
}

/// Hillshade layer over the hillshade DEM source
pub fn hillshade_layer(state: &ViewerState) -> LayerSpec {
    let layer = hillshade_paint(state).into_iter().fold(
        LayerSpec::new(HILLSHADE_LAYER_ID, LayerKind::Hillshade).source(HILLSHADE_SOURCE_ID),
        |layer, (name, value)| layer.paint(&name, value),
    );
    layer.visible(state.show_hillshade)
}

/// `#rrggbb` (leading `#` optional) to its components; black when malformed
pub fn hex_to_rgb(hex: &str) -> (u8, u8, u8) {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return (0, 0, 0);
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => (r, g, b),
        _ => (0, 0, 0),
    }
}

fn rgba(hex: &str, alpha: f64) -> String {
    let (r, g, b) = hex_to_rgb(hex);
    format!("rgba({}, {}, {}, {})", r, g, b, alpha)
}
