use crate::types::{GeoBounds, GeoTransform, LstError, LstResult, RasterGrid, RasterProfile};
use gdal::spatial_ref::{CoordTransform, SpatialRef};
use gdal_sys::OSRAxisMappingStrategy;
use ndarray::Array2;

/// Boundary densification used when projecting the source outline
const OUTLINE_STEPS: usize = 21;

/// Tolerance for float noise when a sample lands exactly on the grid edge
const EDGE_EPS: f64 = 1e-6;

/// A raster resampled onto the geographic (EPSG:4326) grid
///
/// Ephemeral: produced for rendering and bounds computation, never persisted.
pub struct ReprojectedGrid {
    pub data: RasterGrid,
    pub transform: GeoTransform,
}

impl ReprojectedGrid {
    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn bounds(&self) -> LstResult<GeoBounds> {
        bounds_from_transform(&self.transform, self.width(), self.height())
    }
}

/// Geographic SRS with longitude/latitude axis order
fn geographic_srs() -> LstResult<SpatialRef> {
    let srs = SpatialRef::from_epsg(4326)?;
    srs.set_axis_mapping_strategy(OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);
    Ok(srs)
}

/// Source SRS from the profile WKT; a raster without one cannot be warped
fn source_srs(profile: &RasterProfile) -> LstResult<SpatialRef> {
    if profile.projection.trim().is_empty() {
        return Err(LstError::MissingCrs(
            "Source raster declares no coordinate reference system".to_string(),
        ));
    }
    let srs = SpatialRef::from_wkt(&profile.projection)?;
    srs.set_axis_mapping_strategy(OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);
    Ok(srs)
}

/// Compute the default geographic transform for a source raster
///
/// The source outline (corners plus densified edges) is projected into
/// EPSG:4326 and enclosed in a box. The destination keeps the source column
/// count with square pixels, so the geographic pixel size tracks the source
/// resolution; the row count covers the box extent to within half a pixel.
pub fn default_geographic_transform(
    profile: &RasterProfile,
) -> LstResult<(GeoTransform, usize, usize)> {
    if !profile.geo_transform.is_north_up() {
        return Err(LstError::Processing(
            "Rotated geotransforms are not supported".to_string(),
        ));
    }

    let src_srs = source_srs(profile)?;
    let dst_srs = geographic_srs()?;
    let to_geographic = CoordTransform::new(&src_srs, &dst_srs)?;

    let gt = &profile.geo_transform;
    let (w, h) = (profile.width as f64, profile.height as f64);

    // Densified outline in source world coordinates
    let mut xs = Vec::with_capacity(4 * (OUTLINE_STEPS + 1));
    let mut ys = Vec::with_capacity(4 * (OUTLINE_STEPS + 1));
    for i in 0..=OUTLINE_STEPS {
        let f = i as f64 / OUTLINE_STEPS as f64;
        for (px, py) in [(f * w, 0.0), (f * w, h), (0.0, f * h), (w, f * h)] {
            xs.push(gt.top_left_x + px * gt.pixel_width);
            ys.push(gt.top_left_y + py * gt.pixel_height);
        }
    }
    let mut zs = vec![0.0; xs.len()];
    to_geographic.transform_coords(&mut xs, &mut ys, &mut zs)?;

    let west = xs.iter().cloned().fold(f64::INFINITY, f64::min);
    let east = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let south = ys.iter().cloned().fold(f64::INFINITY, f64::min);
    let north = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    if !(west.is_finite() && east.is_finite() && south.is_finite() && north.is_finite()) {
        return Err(LstError::Processing(
            "Source outline does not project to finite geographic coordinates".to_string(),
        ));
    }

    let dst_width = profile.width.max(1);
    let pixel = (east - west) / dst_width as f64;
    if pixel <= 0.0 {
        return Err(LstError::Processing(format!(
            "Degenerate geographic extent: west={}, east={}",
            west, east
        )));
    }
    let dst_height = (((north - south) / pixel).round() as usize).max(1);

    let transform = GeoTransform {
        top_left_x: west,
        pixel_width: pixel,
        rotation_x: 0.0,
        top_left_y: north,
        rotation_y: 0.0,
        pixel_height: -pixel,
    };

    Ok((transform, dst_width, dst_height))
}

/// Resample a raster onto the geographic grid with bilinear interpolation
///
/// Destination pixels are inverse-mapped to fractional source indices and
/// interpolated from the four nearest neighbors. Samples outside the source
/// grid are NaN, and a NaN neighbor propagates into the result, so values
/// blended across a nodata boundary come out invalid instead of extrapolated.
pub fn reproject_to_geographic(
    grid: &RasterGrid,
    profile: &RasterProfile,
) -> LstResult<ReprojectedGrid> {
    let (height, width) = grid.dim();
    if (height, width) != (profile.height, profile.width) {
        return Err(LstError::GeometryMismatch(format!(
            "Grid shape {:?} does not match profile {}x{}",
            grid.dim(),
            profile.width,
            profile.height
        )));
    }

    let (dst_transform, dst_width, dst_height) = default_geographic_transform(profile)?;

    let src_srs = source_srs(profile)?;
    let dst_srs = geographic_srs()?;
    let to_source = CoordTransform::new(&dst_srs, &src_srs)?;

    log::debug!(
        "Reprojecting {}x{} -> {}x{} (pixel {} deg)",
        width,
        height,
        dst_width,
        dst_height,
        dst_transform.pixel_width
    );

    let gt = &profile.geo_transform;
    let mut data = Array2::<f32>::from_elem((dst_height, dst_width), f32::NAN);

    for row in 0..dst_height {
        // One coordinate-transform call per destination row
        let lat = dst_transform.top_left_y + (row as f64 + 0.5) * dst_transform.pixel_height;
        let mut xs: Vec<f64> = (0..dst_width)
            .map(|col| dst_transform.top_left_x + (col as f64 + 0.5) * dst_transform.pixel_width)
            .collect();
        let mut ys = vec![lat; dst_width];
        let mut zs = vec![0.0; dst_width];
        to_source.transform_coords(&mut xs, &mut ys, &mut zs)?;

        for col in 0..dst_width {
            let px = (xs[col] - gt.top_left_x) / gt.pixel_width - 0.5;
            let py = (ys[col] - gt.top_left_y) / gt.pixel_height - 0.5;
            data[[row, col]] = bilinear_sample(grid, px, py);
        }
    }

    Ok(ReprojectedGrid {
        data,
        transform: dst_transform,
    })
}

/// Bilinear interpolation at fractional pixel indices
fn bilinear_sample(grid: &RasterGrid, x: f64, y: f64) -> f32 {
    let (height, width) = grid.dim();
    let x_max = (width - 1) as f64;
    let y_max = (height - 1) as f64;

    if x < -EDGE_EPS || y < -EDGE_EPS || x > x_max + EDGE_EPS || y > y_max + EDGE_EPS {
        return f32::NAN;
    }
    let x = x.clamp(0.0, x_max);
    let y = y.clamp(0.0, y_max);

    let x1 = x.floor() as usize;
    let y1 = y.floor() as usize;
    let x2 = (x1 + 1).min(width - 1);
    let y2 = (y1 + 1).min(height - 1);

    let dx = x - x1 as f64;
    let dy = y - y1 as f64;

    let v11 = grid[[y1, x1]] as f64;
    let v12 = grid[[y2, x1]] as f64;
    let v21 = grid[[y1, x2]] as f64;
    let v22 = grid[[y2, x2]] as f64;

    let interpolated = v11 * (1.0 - dx) * (1.0 - dy)
        + v21 * dx * (1.0 - dy)
        + v12 * (1.0 - dx) * dy
        + v22 * dx * dy;

    interpolated as f32
}

/// Derive geographic bounds from a destination transform and grid shape
///
/// In the north-up convention pixel_height is negative, so south < north
/// must hold afterwards; a violation means the transform sign is wrong and
/// is reported as a bug rather than silently flipped.
pub fn bounds_from_transform(
    transform: &GeoTransform,
    width: usize,
    height: usize,
) -> LstResult<GeoBounds> {
    let west = transform.top_left_x;
    let north = transform.top_left_y;
    let east = west + transform.pixel_width * width as f64;
    let south = north + transform.pixel_height * height as f64;

    if south >= north || west >= east {
        return Err(LstError::Processing(format!(
            "Invalid geographic bounds (sign error in transform?): south={}, north={}, west={}, east={}",
            south, north, west, east
        )));
    }

    Ok(GeoBounds {
        south,
        west,
        north,
        east,
    })
}
