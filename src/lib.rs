//! thermstack: A Fast Yearly Land-Surface-Temperature Compositor and Web Overlay Renderer
//!
//! This library turns monthly single-band LST GeoTIFFs into per-year mean
//! composites and renders each composite as a color-mapped, georeferenced
//! RGBA overlay (plus the WGS84 bounds and display range a web map needs to
//! place it).

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    DisplayRange, GeoBounds, GeoTransform, LstError, LstReal, LstResult, RasterGrid,
    RasterProfile, YearMetadata,
};

pub use crate::core::{AverageParams, ColormapRenderer, RenderParams, TemporalAverager};
pub use crate::io::{MetadataStore, RasterFile};
