//! Shareable viewer state, persisted in the page URL's query string.
//!
//! Every field has a default; the query string only carries the fields that
//! differ from it, so a pristine viewer has an empty query. Parsing is
//! forgiving: unknown keys are ignored and a value that does not parse falls
//! back to the field's default.

use crate::contour::thresholds::ContourThresholdTable;
use crate::core::geo::LatLng;
use crate::surface::controller::ContourVisibility;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewerState {
    /// `2d`, `3d` or `globe`
    pub view_mode: String,
    pub split_screen: bool,
    /// Terrain source of the primary map; contours derive from it
    pub source_a: String,
    pub source_b: String,

    pub show_hillshade: bool,
    pub hillshade_opacity: f64,
    pub show_color_relief: bool,
    pub color_relief_opacity: f64,
    pub show_contours_and_graticules: bool,
    pub show_contours: bool,
    pub show_contour_labels: bool,
    pub show_graticules: bool,
    pub color_ramp: String,
    pub show_raster_basemap: bool,
    pub show_background: bool,
    pub raster_basemap_opacity: f64,
    pub basemap_source: String,
    pub exaggeration: f64,

    // Camera
    pub lat: f64,
    pub lng: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,

    // Hillshade
    pub illumination_dir: f64,
    pub illumination_alt: f64,
    pub shadow_color: String,
    pub highlight_color: String,
    pub accent_color: String,
    pub hillshade_exag: f64,
    pub hillshade_method: String,

    /// Minor contour interval in meters
    pub contour_minor: f64,
    /// Major contour interval in meters
    pub contour_major: f64,

    pub custom_hypso_min_max: bool,
    pub min_elevation: f64,
    pub max_elevation: f64,
    pub hypso_slider_min_bound: f64,
    pub hypso_slider_max_bound: f64,

    pub graticule_color: String,
    pub graticule_width: f64,
    pub show_graticule_labels: bool,
    pub graticule_density: f64,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            view_mode: "3d".to_string(),
            split_screen: false,
            source_a: "mapterhorn".to_string(),
            source_b: "maptiler".to_string(),
            show_hillshade: true,
            hillshade_opacity: 1.0,
            show_color_relief: false,
            color_relief_opacity: 0.35,
            show_contours_and_graticules: false,
            show_contours: true,
            show_contour_labels: true,
            show_graticules: false,
            color_ramp: "mby".to_string(),
            show_raster_basemap: false,
            show_background: false,
            raster_basemap_opacity: 1.0,
            basemap_source: "esri".to_string(),
            exaggeration: 1.0,
            lat: 45.9763,
            lng: 7.6586,
            zoom: 12.5,
            pitch: 60.0,
            bearing: 0.0,
            illumination_dir: 315.0,
            illumination_alt: 45.0,
            shadow_color: "#000000".to_string(),
            highlight_color: "#FFFFFF".to_string(),
            accent_color: "#808080".to_string(),
            hillshade_exag: 1.0,
            hillshade_method: "combined".to_string(),
            contour_minor: 50.0,
            contour_major: 200.0,
            custom_hypso_min_max: false,
            min_elevation: 0.0,
            max_elevation: 8100.0,
            hypso_slider_min_bound: 0.0,
            hypso_slider_max_bound: 8100.0,
            graticule_color: "#cccccc".to_string(),
            graticule_width: 1.0,
            show_graticule_labels: false,
            graticule_density: 0.0,
        }
    }
}

impl ViewerState {
    /// Encodes the fields that differ from their defaults as
    /// `key=value&...`, keys sorted.
    pub fn to_query_string(&self) -> Result<String> {
        let current = to_object(self)?;
        let defaults = to_object(&ViewerState::default())?;

        let pairs: Vec<(String, String)> = current
            .into_iter()
            .filter(|(key, value)| defaults.get(key) != Some(value))
            .map(|(key, value)| (key, query_value(&value)))
            .collect();
        Ok(serde_urlencoded::to_string(pairs)?)
    }

    /// Decodes a query string (with or without the leading `?`)
    pub fn from_query_string(query: &str) -> Result<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)?;
        let mut fields = to_object(&ViewerState::default())?;

        for (key, raw) in pairs {
            let Some(default) = fields.get(&key) else {
                log::debug!("ignoring unknown query parameter {}", key);
                continue;
            };
            match parse_like(default, &raw) {
                Some(value) => {
                    fields.insert(key, value);
                }
                None => log::warn!("invalid value {:?} for {}, using default", raw, key),
            }
        }
        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    /// Contour layer visibility. Both layers sit behind the master
    /// contours-and-graticules switch; labels also need lines.
    pub fn contour_visibility(&self) -> ContourVisibility {
        let lines = self.show_contours_and_graticules && self.show_contours;
        ContourVisibility {
            lines,
            labels: lines && self.show_contour_labels,
        }
    }

    pub fn threshold_table(&self) -> Result<ContourThresholdTable> {
        ContourThresholdTable::from_intervals(self.contour_minor, self.contour_major)
    }

    /// Whether contour intervals differ from `other`'s
    pub fn intervals_changed(&self, other: &ViewerState) -> bool {
        self.contour_minor != other.contour_minor || self.contour_major != other.contour_major
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    pub fn is_2d(&self) -> bool {
        self.view_mode == "2d"
    }

    /// Camera pitch; a 2D view is always looked at straight down
    pub fn effective_pitch(&self) -> f64 {
        if self.is_2d() {
            0.0
        } else {
            self.pitch
        }
    }

    pub fn effective_bearing(&self) -> f64 {
        if self.is_2d() {
            0.0
        } else {
            self.bearing
        }
    }
}

fn to_object(state: &ViewerState) -> Result<Map<String, Value>> {
    match serde_json::to_value(state)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

/// Whole floats are written without a fraction (`25`, not `25.0`)
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Parses `raw` into a value of the same JSON type as `default`
fn parse_like(default: &Value, raw: &str) -> Option<Value> {
    match default {
        Value::Bool(_) => raw.parse::<bool>().ok().map(Value::Bool),
        Value::Number(_) => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        Value::String(_) => Some(Value::String(raw.to_string())),
        _ => None,
    }
}
