use crate::contour::cache::DemTileCache;
use crate::contour::fetch::TileFetcher;
use crate::contour::handler::{ContourGenerator, ContourProtocolHandler};
use crate::contour::options::ContourTileOptions;
use crate::core::constants::{DEFAULT_DEM_SOURCE_ID, DEM_CACHE_SIZE, DEM_TIMEOUT_MS};
use crate::protocol::{ProtocolHandler, ProtocolRegistry};
use crate::terrain::encoding::DemEncoding;
use crate::terrain::resolver::ResolvedElevationSource;
use std::sync::Arc;
use std::time::Duration;

/// Construction parameters of a contour tile source.
#[derive(Debug, Clone, PartialEq)]
pub struct DemSourceOptions {
    /// Protocol schemes are derived from it (`{id}-contour`)
    pub id: String,
    /// DEM tile URL template with `{z}/{x}/{y}`
    pub url: String,
    pub encoding: DemEncoding,
    pub max_zoom: u8,
    /// Run contour generation on a blocking worker thread
    pub worker: bool,
    pub cache_size: usize,
    pub timeout: Duration,
}

impl DemSourceOptions {
    pub fn new(url: impl Into<String>, encoding: DemEncoding, max_zoom: u8) -> Self {
        Self {
            id: DEFAULT_DEM_SOURCE_ID.to_string(),
            url: url.into(),
            encoding,
            max_zoom,
            worker: true,
            cache_size: DEM_CACHE_SIZE,
            timeout: Duration::from_millis(DEM_TIMEOUT_MS),
        }
    }

    pub fn from_resolved(resolved: &ResolvedElevationSource) -> Self {
        Self::new(
            resolved.tile_url_template.clone(),
            resolved.encoding,
            resolved.max_zoom,
        )
    }
}

/// Derives contour vector tiles on demand from a DEM tile source.
///
/// The map requests tiles through the URL from
/// [`contour_protocol_url`](Self::contour_protocol_url); those requests reach
/// this source once [`setup_protocol`](Self::setup_protocol) has registered
/// its handler.
pub struct ContourTileSource {
    options: DemSourceOptions,
    handler: Arc<ContourProtocolHandler>,
}

impl ContourTileSource {
    pub fn new(
        options: DemSourceOptions,
        fetcher: Arc<dyn TileFetcher>,
        generator: Arc<dyn ContourGenerator>,
    ) -> Self {
        let handler = Arc::new(ContourProtocolHandler::new(options.clone(), fetcher, generator));
        Self { options, handler }
    }

    pub fn options(&self) -> &DemSourceOptions {
        &self.options
    }

    pub fn contour_protocol_id(&self) -> String {
        format!("{}-contour", self.options.id)
    }

    /// `{id}-contour://{z}/{x}/{y}`, the part of the URL the map fills in
    pub fn contour_protocol_url_base(&self) -> String {
        format!("{}://{{z}}/{{x}}/{{y}}", self.contour_protocol_id())
    }

    /// Tile URL template for a vector source serving contours with `options`
    pub fn contour_protocol_url(&self, options: &ContourTileOptions) -> String {
        format!("{}?{}", self.contour_protocol_url_base(), options.encode_query())
    }

    /// Registers this source's handler, replacing any handler already bound
    /// to the scheme.
    pub fn setup_protocol(&self, registry: &ProtocolRegistry) {
        registry.add_protocol(&self.contour_protocol_id(), self.protocol_handler());
    }

    /// Unregisters the handler if it is still this source's
    pub fn remove_protocol(&self, registry: &ProtocolRegistry) -> bool {
        registry.remove_protocol_if(&self.contour_protocol_id(), &self.protocol_handler())
    }

    pub fn cache(&self) -> &DemTileCache {
        self.handler.cache()
    }

    fn protocol_handler(&self) -> Arc<dyn ProtocolHandler> {
        self.handler.clone()
    }
}

impl std::fmt::Debug for ContourTileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContourTileSource")
            .field("options", &self.options)
            .finish()
    }
}
