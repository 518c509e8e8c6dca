use crate::types::{GeoTransform, LstError, LstResult, RasterGrid, RasterProfile};
use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager};
use ndarray::Array2;
use std::path::Path;

/// Single-band raster reader/writer backed by GDAL
pub struct RasterFile;

impl RasterFile {
    /// Read band 1 and its georeferencing profile from a raster file
    pub fn read_band<P: AsRef<Path>>(path: P) -> LstResult<(RasterGrid, RasterProfile)> {
        log::debug!("Reading raster: {}", path.as_ref().display());

        let dataset = Dataset::open(path.as_ref())?;

        let geo_transform = dataset.geo_transform()?;
        let (width, height) = dataset.raster_size();
        let projection = dataset.projection();

        let rasterband = dataset.rasterband(1)?;
        let nodata = rasterband.no_data_value();
        let band_data = rasterband.read_as::<f32>((0, 0), (width, height), (width, height), None)?;

        let grid = Array2::from_shape_vec((height, width), band_data.data)
            .map_err(|e| LstError::Processing(format!("Failed to reshape band data: {}", e)))?;

        let profile = RasterProfile {
            width,
            height,
            geo_transform: GeoTransform::from_gdal(&geo_transform),
            projection,
            nodata,
        };

        log::debug!(
            "Raster size: {}x{}, nodata: {:?}",
            width,
            height,
            profile.nodata
        );

        Ok((grid, profile))
    }

    /// Write a float32 single-band GeoTIFF with the given profile
    ///
    /// The profile's nodata value (if any) is written to the band; callers
    /// producing composites pass NaN here so no finite sentinel survives.
    pub fn write_band<P: AsRef<Path>>(
        path: P,
        grid: &RasterGrid,
        profile: &RasterProfile,
    ) -> LstResult<()> {
        log::info!("Writing raster: {}", path.as_ref().display());

        let driver = DriverManager::get_driver_by_name("GTiff")?;
        let (height, width) = grid.dim();

        let mut dataset = driver.create_with_band_type::<f32, _>(
            path.as_ref(),
            width as isize,
            height as isize,
            1,
        )?;

        dataset.set_geo_transform(&profile.geo_transform.to_gdal())?;

        if !profile.projection.is_empty() {
            let srs = gdal::spatial_ref::SpatialRef::from_wkt(&profile.projection)?;
            dataset.set_spatial_ref(&srs)?;
        }

        let mut rasterband = dataset.rasterband(1)?;
        let flat_data: Vec<f32> = grid.iter().cloned().collect();
        let buffer = Buffer::new((width, height), flat_data);
        rasterband.write((0, 0), (width, height), &buffer)?;

        if let Some(nodata) = profile.nodata {
            rasterband.set_no_data_value(Some(nodata))?;
        }

        Ok(())
    }
}
