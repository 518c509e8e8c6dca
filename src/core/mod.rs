//! Core compositing and rendering modules

pub mod average;
pub mod colormap;
pub mod reproject;

// Re-export main types
pub use average::{AverageParams, Coverage, RasterStack, TemporalAverager, YearComposite};
pub use colormap::{ColormapRenderer, RenderParams};
pub use reproject::{
    bounds_from_transform, default_geographic_transform, reproject_to_geographic, ReprojectedGrid,
};
