//! Elevation source resolution.
//!
//! Turns a terrain-source key (built-in catalog key or custom source id) into
//! a concrete tile URL template and encoding. Nothing here touches the
//! network: a misconfigured key resolves to an empty URL and the failure shows
//! up later as tile-load errors.

use crate::core::config::ViewerSettings;
use crate::core::constants::DEFAULT_DEM_MAX_ZOOM;
use crate::surface::spec::SourceSpec;
use crate::terrain::catalog::{self, API_KEY_PLACEHOLDER};
use crate::terrain::custom::{CustomSourceType, CustomTerrainSource};
use crate::terrain::encoding::DemEncoding;

/// Tile size assumed for custom sources.
const CUSTOM_TILE_SIZE: u32 = 512;

/// Max zoom of raster-dem sources built from custom sources; the tile server
/// resamples past the native resolution.
const CUSTOM_RASTER_DEM_MAX_ZOOM: u8 = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedElevationSource {
    pub tile_url_template: String,
    pub encoding: DemEncoding,
    pub max_zoom: u8,
    pub tile_size: u32,
}

impl ResolvedElevationSource {
    /// Resolution result for keys nothing knows about
    fn unresolved() -> Self {
        Self {
            tile_url_template: String::new(),
            encoding: DemEncoding::Mapbox,
            max_zoom: DEFAULT_DEM_MAX_ZOOM,
            tile_size: CUSTOM_TILE_SIZE,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.tile_url_template.is_empty()
    }
}

pub struct ElevationSourceResolver<'a> {
    settings: &'a ViewerSettings,
}

impl<'a> ElevationSourceResolver<'a> {
    pub fn new(settings: &'a ViewerSettings) -> Self {
        Self { settings }
    }

    /// Resolves the source the contour decoder fetches DEM tiles from.
    ///
    /// COG and VRT sources always go through TiTiler here: the decoder fetches
    /// plain HTTP tiles and cannot use the `cog://` protocol.
    pub fn resolve(&self, key: &str) -> ResolvedElevationSource {
        if let Some(custom) = self.settings.custom_terrain_source(key) {
            let tile_url_template = match custom.source_type {
                CustomSourceType::Cog => self.titiler_cog_url(&custom.url),
                CustomSourceType::Vrt => self.titiler_vrt_url(&custom.url),
                CustomSourceType::TerrainRgb | CustomSourceType::Terrarium => custom.url.clone(),
            };
            return ResolvedElevationSource {
                tile_url_template,
                encoding: custom.source_type.dem_encoding(),
                max_zoom: DEFAULT_DEM_MAX_ZOOM,
                tile_size: CUSTOM_TILE_SIZE,
            };
        }

        match catalog::builtin(key) {
            Some(entry) => ResolvedElevationSource {
                tile_url_template: entry
                    .tile_url_template
                    .replace(API_KEY_PLACEHOLDER, self.provider_key(key)),
                encoding: entry.encoding.dem_encoding(),
                max_zoom: entry.max_zoom,
                tile_size: entry.tile_size,
            },
            None => {
                log::warn!("[contours] unknown terrain source '{}', using an empty tile URL", key);
                ResolvedElevationSource::unresolved()
            }
        }
    }

    /// Builds the raster-dem source backing 3D terrain and hillshading.
    /// Returns `None` for unknown keys.
    pub fn raster_dem_source(&self, key: &str) -> Option<SourceSpec> {
        if let Some(custom) = self.settings.custom_terrain_source(key) {
            return Some(self.custom_raster_dem_source(custom));
        }

        let entry = catalog::builtin(key)?;
        let resolved = self.resolve(key);
        Some(SourceSpec::RasterDem {
            tiles: Some(vec![resolved.tile_url_template]),
            url: None,
            tile_size: entry.tile_size,
            maxzoom: entry.max_zoom,
            encoding: resolved.encoding,
        })
    }

    fn custom_raster_dem_source(&self, custom: &CustomTerrainSource) -> SourceSpec {
        let use_protocol = self.settings.use_cog_protocol_vs_titiler;
        let (tiles, url) = match custom.source_type {
            CustomSourceType::Cog if use_protocol => (None, Some(format!("cog://{}#dem", custom.url))),
            CustomSourceType::Cog => (Some(vec![self.titiler_cog_url(&custom.url)]), None),
            CustomSourceType::Vrt if use_protocol => {
                log::warn!("VRT source '{}' can only be streamed through TiTiler", custom.id);
                (Some(vec![custom.url.clone()]), None)
            }
            CustomSourceType::Vrt => (Some(vec![self.titiler_vrt_url(&custom.url)]), None),
            CustomSourceType::TerrainRgb | CustomSourceType::Terrarium => {
                (Some(vec![custom.url.clone()]), None)
            }
        };

        SourceSpec::RasterDem {
            tiles,
            url,
            tile_size: CUSTOM_TILE_SIZE,
            maxzoom: CUSTOM_RASTER_DEM_MAX_ZOOM,
            encoding: custom.source_type.dem_encoding(),
        }
    }

    /// TiTiler route rendering a COG as TerrainRGB tiles
    pub fn titiler_cog_url(&self, cog_url: &str) -> String {
        format!(
            "{}/cog/tiles/WebMercatorQuad/{{z}}/{{x}}/{{y}}.png?&nodata=0&resampling=bilinear&algorithm=terrainrgb&url={}",
            self.settings.titiler_base(),
            encode_component(cog_url)
        )
    }

    /// TiTiler route rendering a VRT as TerrainRGB tiles
    pub fn titiler_vrt_url(&self, vrt_url: &str) -> String {
        format!(
            "{}/cog/tiles/WebMercatorQuad/{{z}}/{{x}}/{{y}}.png?&nodata=-999&resampling=bilinear&algorithm=terrainrgb&url=vrt:///vsicurl/{}",
            self.settings.titiler_base(),
            encode_component(vrt_url)
        )
    }

    fn provider_key(&self, key: &str) -> &str {
        match key {
            "mapbox" => &self.settings.mapbox_key,
            "maptiler" => &self.settings.maptiler_key,
            _ => "",
        }
    }
}

/// Percent-encodes a single query parameter value
pub(crate) fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(source: CustomTerrainSource) -> ViewerSettings {
        ViewerSettings {
            custom_terrain_sources: vec![source],
            ..Default::default()
        }
    }

    #[test]
    fn test_builtin_resolution() {
        let settings = ViewerSettings::default();
        let resolved = ElevationSourceResolver::new(&settings).resolve("mapterhorn");
        assert_eq!(resolved.tile_url_template, "https://tiles.mapterhorn.com/{z}/{x}/{y}.webp");
        assert_eq!(resolved.encoding, DemEncoding::Terrarium);
        assert_eq!(resolved.max_zoom, 14);
        assert_eq!(resolved.tile_size, 512);
    }

    #[test]
    fn test_api_key_substitution() {
        let settings = ViewerSettings {
            maptiler_key: "secret".to_string(),
            ..Default::default()
        };
        let resolver = ElevationSourceResolver::new(&settings);
        let maptiler = resolver.resolve("maptiler");
        assert!(maptiler.tile_url_template.ends_with("?key=secret"));
        assert_eq!(maptiler.encoding, DemEncoding::Mapbox);
        assert_eq!(maptiler.max_zoom, 12);

        // Unset key leaves an empty value, the request fails downstream
        let mapbox = resolver.resolve("mapbox");
        assert!(mapbox.tile_url_template.ends_with("access_token="));
        assert!(!mapbox.tile_url_template.contains(API_KEY_PLACEHOLDER));
    }

    #[test]
    fn test_cog_goes_through_titiler_with_mapbox_encoding() {
        let settings = settings_with(CustomTerrainSource::new(
            "alps",
            "Alps",
            "https://data.example.org/alps dtm.tif",
            CustomSourceType::Cog,
        ));
        let resolved = ElevationSourceResolver::new(&settings).resolve("alps");
        assert_eq!(
            resolved.tile_url_template,
            "https://titiler.xyz/cog/tiles/WebMercatorQuad/{z}/{x}/{y}.png?&nodata=0&resampling=bilinear&algorithm=terrainrgb&url=https%3A%2F%2Fdata.example.org%2Falps+dtm.tif"
        );
        assert_eq!(resolved.encoding, DemEncoding::Mapbox);
        assert_eq!(resolved.max_zoom, 14);
    }

    #[test]
    fn test_tms_custom_source_is_verbatim() {
        let url = "https://tiles.example.org/terrarium/{z}/{x}/{y}.png";
        let settings = settings_with(CustomTerrainSource::new("t", "T", url, CustomSourceType::Terrarium));
        let resolved = ElevationSourceResolver::new(&settings).resolve("t");
        assert_eq!(resolved.tile_url_template, url);
        assert_eq!(resolved.encoding, DemEncoding::Terrarium);
    }

    #[test]
    fn test_custom_source_shadows_builtin_key() {
        let url = "https://mirror.example.org/{z}/{x}/{y}.png";
        let settings =
            settings_with(CustomTerrainSource::new("mapterhorn", "Mirror", url, CustomSourceType::TerrainRgb));
        let resolved = ElevationSourceResolver::new(&settings).resolve("mapterhorn");
        assert_eq!(resolved.tile_url_template, url);
        assert_eq!(resolved.encoding, DemEncoding::Mapbox);
    }

    #[test]
    fn test_unknown_key_resolves_empty() {
        let settings = ViewerSettings::default();
        let resolver = ElevationSourceResolver::new(&settings);
        let resolved = resolver.resolve("nowhere");
        assert!(!resolved.is_resolved());
        assert_eq!(resolved.encoding, DemEncoding::Mapbox);
        assert!(resolver.raster_dem_source("nowhere").is_none());
    }

    #[test]
    fn test_raster_dem_source_for_cog_protocol() {
        let mut settings = settings_with(CustomTerrainSource::new(
            "alps",
            "Alps",
            "https://data.example.org/alps.tif",
            CustomSourceType::Cog,
        ));
        settings.use_cog_protocol_vs_titiler = true;
        let source = ElevationSourceResolver::new(&settings).raster_dem_source("alps").unwrap();
        assert_eq!(
            source,
            SourceSpec::RasterDem {
                tiles: None,
                url: Some("cog://https://data.example.org/alps.tif#dem".to_string()),
                tile_size: 512,
                maxzoom: 20,
                encoding: DemEncoding::Mapbox,
            }
        );
    }

    #[test]
    fn test_raster_dem_source_for_builtin() {
        let settings = ViewerSettings::default();
        let source = ElevationSourceResolver::new(&settings).raster_dem_source("aws").unwrap();
        assert_eq!(source.encoding(), Some(DemEncoding::Terrarium));
        assert_eq!(
            source.first_tile_url(),
            Some("https://s3.amazonaws.com/elevation-tiles-prod/terrarium/{z}/{x}/{y}.png")
        );
    }

    #[test]
    fn test_vrt_route() {
        let settings = settings_with(CustomTerrainSource::new(
            "v",
            "V",
            "https://x.org/a.vrt",
            CustomSourceType::Vrt,
        ));
        let resolved = ElevationSourceResolver::new(&settings).resolve("v");
        assert!(resolved
            .tile_url_template
            .ends_with("nodata=-999&resampling=bilinear&algorithm=terrainrgb&url=vrt:///vsicurl/https%3A%2F%2Fx.org%2Fa.vrt"));
    }
}
