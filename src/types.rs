use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Real-valued raster sample data
pub type LstReal = f32;

/// 2D single-band raster data array (row x column)
pub type RasterGrid = Array2<LstReal>;

/// Six-parameter affine transform mapping pixel indices to world coordinates
///
/// Same layout as GDAL's geotransform array: world_x = top_left_x +
/// col * pixel_width + row * rotation_x, and likewise for world_y.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn from_gdal(gt: &[f64; 6]) -> Self {
        Self {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }

    /// True for north-up grids without row/column rotation
    pub fn is_north_up(&self) -> bool {
        self.rotation_x == 0.0 && self.rotation_y == 0.0
    }
}

/// Georeferencing profile of a single-band raster
///
/// Captured from the first raster of a stack and used as the canonical
/// profile for every output derived from that stack.
#[derive(Debug, Clone)]
pub struct RasterProfile {
    pub width: usize,
    pub height: usize,
    pub geo_transform: GeoTransform,
    /// Projection as WKT; empty when the source declares no CRS
    pub projection: String,
    pub nodata: Option<f64>,
}

impl RasterProfile {
    /// Geometry equality check used to validate raster stacks
    pub fn same_geometry(&self, other: &RasterProfile) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.geo_transform == other.geo_transform
    }
}

/// Geographic bounding box in degrees (EPSG:4326)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

/// Display value range used for color normalization, never written back
/// into the data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRange {
    pub min: f64,
    pub max: f64,
}

/// Per-year record consumed by the map front end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearMetadata {
    pub bounds: GeoBounds,
    pub stats: DisplayRange,
}

/// Error types for the compositing pipeline
#[derive(Debug, thiserror::Error)]
pub enum LstError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Raster geometry mismatch: {0}")]
    GeometryMismatch(String),

    #[error("Missing or invalid coordinate reference system: {0}")]
    MissingCrs(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Result type for pipeline operations
pub type LstResult<T> = Result<T, LstError>;
