//! I/O modules for raster files, input discovery, and the metadata record

pub mod discovery;
pub mod metadata;
pub mod raster;

pub use metadata::MetadataStore;
pub use raster::RasterFile;
