//! Style layers drawing the contour source.

use crate::core::config::Theme;
use crate::core::constants::{
    CONTOUR_LABELS_LAYER_ID, CONTOUR_LINES_LAYER_ID, CONTOUR_SOURCE_ID, CONTOUR_SOURCE_LAYER,
};
use crate::surface::spec::{LayerKind, LayerSpec};
use serde_json::json;

/// Contour lines; major levels drawn at full width
pub fn contour_lines_layer(visible: bool, theme: Theme) -> LayerSpec {
    let color = match theme {
        Theme::Light => "rgba(0,0,0, 50%)",
        Theme::Dark => "rgba(255,255,255, 50%)",
    };
    LayerSpec::new(CONTOUR_LINES_LAYER_ID, LayerKind::Line)
        .source(CONTOUR_SOURCE_ID)
        .source_layer(CONTOUR_SOURCE_LAYER)
        .paint("line-color", json!(color))
        .paint("line-width", json!(["match", ["get", "level"], 1, 1, 0.5]))
        .visible(visible)
}

/// Elevation labels placed along major contours
pub fn contour_labels_layer(visible: bool, theme: Theme) -> LayerSpec {
    let (text, halo) = match theme {
        Theme::Light => ("#000000", "#ffffff"),
        Theme::Dark => ("#ffffff", "#000000"),
    };
    LayerSpec::new(CONTOUR_LABELS_LAYER_ID, LayerKind::Symbol)
        .source(CONTOUR_SOURCE_ID)
        .source_layer(CONTOUR_SOURCE_LAYER)
        .filter(json!([">", ["get", "level"], 0]))
        .paint("text-halo-color", json!(halo))
        .paint("text-halo-width", json!(1))
        .paint("text-color", json!(text))
        .layout("symbol-placement", json!("line"))
        .layout("text-size", json!(10))
        .layout(
            "text-field",
            json!(["concat", ["number-format", ["get", "ele"], {}], "m"]),
        )
        .layout("text-font", json!(["Noto Sans Bold"]))
        .visible(visible)
}
