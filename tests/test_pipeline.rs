use approx::assert_abs_diff_eq;
use gdal::spatial_ref::SpatialRef;
use ndarray::array;
use std::path::Path;

use thermstack::core::{reproject, ColormapRenderer, RasterStack, RenderParams, TemporalAverager};
use thermstack::io::{discovery, MetadataStore, RasterFile};
use thermstack::types::{GeoTransform, RasterGrid, RasterProfile, YearMetadata};

const NODATA: f64 = -9999.0;

fn wgs84_profile() -> RasterProfile {
    RasterProfile {
        width: 2,
        height: 2,
        geo_transform: GeoTransform::from_gdal(&[-3.0, 0.01, 0.0, 41.0, 0.0, -0.01]),
        projection: SpatialRef::from_epsg(4326).unwrap().to_wkt().unwrap(),
        nodata: Some(NODATA),
    }
}

fn write_monthly_raster(dir: &Path, name: &str, grid: &RasterGrid) {
    RasterFile::write_band(dir.join(name), grid, &wgs84_profile()).expect("write monthly raster");
}

#[test]
fn test_average_stage_end_to_end() {
    let dir = tempfile::tempdir().unwrap();

    write_monthly_raster(
        dir.path(),
        "DLST_2024_01_RD_clean.tif",
        &array![[10.0, NODATA as f32], [20.0, 30.0]],
    );
    write_monthly_raster(
        dir.path(),
        "DLST_2024_02_RD_clean.tif",
        &array![[14.0, 22.0], [NODATA as f32, 34.0]],
    );

    let files = discovery::monthly_rasters(dir.path(), "DLST", 2024).unwrap();
    assert_eq!(files.len(), 2);

    let rasters: Vec<_> = files
        .iter()
        .map(|f| RasterFile::read_band(f).unwrap())
        .collect();
    let stack = RasterStack::new(rasters).unwrap();
    let composite = TemporalAverager::new().average(&stack).unwrap();

    // Each off-diagonal pixel is missing in one month and contributes from
    // the other alone
    assert_abs_diff_eq!(composite.data[[0, 0]], 12.0, epsilon = 1e-4);
    assert_abs_diff_eq!(composite.data[[0, 1]], 22.0, epsilon = 1e-4);
    assert_abs_diff_eq!(composite.data[[1, 0]], 20.0, epsilon = 1e-4);
    assert_abs_diff_eq!(composite.data[[1, 1]], 32.0, epsilon = 1e-4);
    assert_eq!(composite.coverage.min_months, 1);
    assert_eq!(composite.coverage.max_months, 2);

    // Persist and read back: nodata must be NaN, never the old sentinel
    let output_path = dir.path().join(discovery::average_raster_name("DLST", 2024));
    RasterFile::write_band(&output_path, &composite.data, &composite.profile).unwrap();

    let (read_back, profile) = RasterFile::read_band(&output_path).unwrap();
    assert!(profile.nodata.unwrap().is_nan());
    assert_abs_diff_eq!(read_back[[0, 0]], 12.0, epsilon = 1e-4);
    assert_abs_diff_eq!(read_back[[1, 1]], 32.0, epsilon = 1e-4);
    assert_eq!(profile.width, 2);
    assert_eq!(profile.height, 2);
}

#[test]
fn test_missing_year_is_empty_not_error() {
    let dir = tempfile::tempdir().unwrap();
    let files = discovery::monthly_rasters(dir.path(), "DLST", 2031).unwrap();
    assert!(files.is_empty());
}

#[test]
fn test_render_stage_end_to_end() {
    let dir = tempfile::tempdir().unwrap();

    // An already-averaged composite on a geographic grid
    let composite = array![[12.0_f32, 22.0], [20.0, 32.0]];
    let mut profile = wgs84_profile();
    profile.nodata = Some(f64::NAN);
    let input_path = dir.path().join(discovery::average_raster_name("DLST", 2024));
    RasterFile::write_band(&input_path, &composite, &profile).unwrap();

    let (grid, profile) = RasterFile::read_band(&input_path).unwrap();
    let reprojected = reproject::reproject_to_geographic(&grid, &profile).unwrap();

    // Geographic source: the default transform reproduces the source grid
    assert_eq!(reprojected.width(), 2);
    assert_eq!(reprojected.height(), 2);
    assert_abs_diff_eq!(reprojected.data[[0, 0]], 12.0, epsilon = 1e-3);
    assert_abs_diff_eq!(reprojected.data[[1, 1]], 32.0, epsilon = 1e-3);

    let bounds = reprojected.bounds().unwrap();
    assert!(bounds.south < bounds.north);
    assert!(bounds.west < bounds.east);
    assert_abs_diff_eq!(bounds.west, -3.0, epsilon = 1e-6);
    assert_abs_diff_eq!(bounds.north, 41.0, epsilon = 1e-6);
    assert_abs_diff_eq!(bounds.east, -2.98, epsilon = 1e-6);
    assert_abs_diff_eq!(bounds.south, 40.98, epsilon = 1e-6);

    let renderer = ColormapRenderer::with_params(RenderParams {
        scale: 2,
        ..RenderParams::default()
    });
    let image_path = dir.path().join(discovery::overlay_image_name("DLST", 2024));
    let (stats, dimensions) = renderer
        .render_to_file(&image_path, &reprojected.data, profile.nodata)
        .unwrap();

    assert_eq!(dimensions, (4, 4));
    assert!(stats.min < stats.max);

    let image = image::open(&image_path).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (4, 4));
    // Every pixel is valid, so the whole overlay has the fixed alpha
    assert!(image.pixels().all(|p| p.0[3] == 200));
    // Coldest pixel clips to blue, hottest to red
    assert_eq!(&image.get_pixel(0, 0).0[..3], &[0, 0, 255]);
    assert_eq!(&image.get_pixel(3, 3).0[..3], &[255, 0, 0]);

    let mut metadata = MetadataStore::new();
    metadata.insert(2024, YearMetadata { bounds, stats });
    let metadata_path = dir.path().join(discovery::metadata_file_name("DLST"));
    metadata.write(&metadata_path).unwrap();

    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&metadata_path).unwrap()).unwrap();
    assert_abs_diff_eq!(
        record["2024"]["bounds"]["north"].as_f64().unwrap(),
        41.0,
        epsilon = 1e-6
    );
    assert!(record["2024"]["stats"]["min"].as_f64().is_some());
}
