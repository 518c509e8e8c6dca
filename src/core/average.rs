use crate::types::{LstError, LstResult, RasterGrid, RasterProfile};
use ndarray::{Array2, Zip};

/// Temporal averaging parameters
#[derive(Debug, Clone)]
pub struct AverageParams {
    /// Nodata sentinel assumed when a source raster declares none.
    /// The "true" missing-value convention is dataset-specific, so this is
    /// configurable rather than baked in.
    pub fallback_nodata: f64,
}

impl Default for AverageParams {
    fn default() -> Self {
        Self {
            fallback_nodata: -9999.0,
        }
    }
}

/// Ordered collection of same-shaped monthly rasters for one year
///
/// The profile of the first raster is canonical; the constructor rejects any
/// member whose width, height, or geotransform differs, since silently
/// averaging misaligned grids would corrupt the composite.
pub struct RasterStack {
    bands: Vec<RasterGrid>,
    profile: RasterProfile,
}

impl RasterStack {
    pub fn new(rasters: Vec<(RasterGrid, RasterProfile)>) -> LstResult<Self> {
        let mut iter = rasters.into_iter();
        let (first_band, profile) = iter.next().ok_or_else(|| {
            LstError::Processing("Cannot build a raster stack from zero rasters".to_string())
        })?;

        let mut bands = vec![first_band];
        for (index, (band, other)) in iter.enumerate() {
            if !profile.same_geometry(&other) {
                return Err(LstError::GeometryMismatch(format!(
                    "Raster {} has size {}x{} and transform {:?}, expected {}x{} and {:?}",
                    index + 1,
                    other.width,
                    other.height,
                    other.geo_transform,
                    profile.width,
                    profile.height,
                    profile.geo_transform,
                )));
            }
            bands.push(band);
        }

        Ok(Self { bands, profile })
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn profile(&self) -> &RasterProfile {
        &self.profile
    }
}

/// Per-pixel contributing-month statistics, reported as a coverage diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coverage {
    pub min_months: u32,
    pub max_months: u32,
}

/// Result of averaging one year's stack
pub struct YearComposite {
    /// Mean over non-missing months; NaN where no month contributed
    pub data: RasterGrid,
    /// Canonical profile with nodata promoted to NaN
    pub profile: RasterProfile,
    pub coverage: Coverage,
}

/// Nodata-aware temporal mean over a stack of monthly rasters
pub struct TemporalAverager {
    params: AverageParams,
}

impl TemporalAverager {
    pub fn new() -> Self {
        Self {
            params: AverageParams::default(),
        }
    }

    pub fn with_params(params: AverageParams) -> Self {
        Self { params }
    }

    /// Compute the per-pixel mean over non-missing samples
    ///
    /// A sample is missing when it equals the stack's nodata sentinel or is
    /// already NaN. Pixels with zero contributing months come out as NaN,
    /// never zero. The output profile carries NaN as its nodata value so no
    /// finite sentinel can be confused with a real temperature.
    pub fn average(&self, stack: &RasterStack) -> LstResult<YearComposite> {
        let nodata = stack.profile.nodata.unwrap_or(self.params.fallback_nodata) as f32;
        let (height, width) = (stack.profile.height, stack.profile.width);

        log::debug!(
            "Averaging {} rasters of {}x{} (nodata: {})",
            stack.len(),
            width,
            height,
            nodata
        );

        // Accumulate in f64; a stack of float32 months loses precision fast
        // when summed in f32.
        let mut sum = Array2::<f64>::zeros((height, width));
        let mut count = Array2::<u32>::zeros((height, width));

        for band in &stack.bands {
            if band.dim() != (height, width) {
                return Err(LstError::GeometryMismatch(format!(
                    "Band shape {:?} does not match profile {}x{}",
                    band.dim(),
                    width,
                    height
                )));
            }
            Zip::from(&mut sum)
                .and(&mut count)
                .and(band)
                .for_each(|s, c, &value| {
                    if !value.is_nan() && value != nodata {
                        *s += value as f64;
                        *c += 1;
                    }
                });
        }

        let data = Zip::from(&sum)
            .and(&count)
            .map_collect(|&s, &c| if c > 0 { (s / c as f64) as f32 } else { f32::NAN });

        let min_months = count.iter().copied().min().unwrap_or(0);
        let max_months = count.iter().copied().max().unwrap_or(0);
        log::info!(
            "Pixel coverage: min={}, max={} months",
            min_months,
            max_months
        );

        let mut profile = stack.profile.clone();
        profile.nodata = Some(f64::NAN);

        Ok(YearComposite {
            data,
            profile,
            coverage: Coverage {
                min_months,
                max_months,
            },
        })
    }
}

impl Default for TemporalAverager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeoTransform;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn test_profile(nodata: Option<f64>) -> RasterProfile {
        RasterProfile {
            width: 2,
            height: 2,
            geo_transform: GeoTransform::from_gdal(&[500_000.0, 30.0, 0.0, 4_500_000.0, 0.0, -30.0]),
            projection: String::new(),
            nodata,
        }
    }

    #[test]
    fn test_two_month_average_with_missing_values() {
        // Each off-diagonal pixel is missing in one month and contributes
        // only from the other.
        let january = array![[10.0_f32, -9999.0], [20.0, 30.0]];
        let february = array![[14.0_f32, 22.0], [-9999.0, 34.0]];

        let stack = RasterStack::new(vec![
            (january, test_profile(Some(-9999.0))),
            (february, test_profile(Some(-9999.0))),
        ])
        .unwrap();

        let composite = TemporalAverager::new().average(&stack).unwrap();

        assert_abs_diff_eq!(composite.data[[0, 0]], 12.0, epsilon = 1e-6);
        assert_abs_diff_eq!(composite.data[[0, 1]], 22.0, epsilon = 1e-6);
        assert_abs_diff_eq!(composite.data[[1, 0]], 20.0, epsilon = 1e-6);
        assert_abs_diff_eq!(composite.data[[1, 1]], 32.0, epsilon = 1e-6);
        assert_eq!(
            composite.coverage,
            Coverage {
                min_months: 1,
                max_months: 2
            }
        );
    }

    #[test]
    fn test_all_missing_pixel_is_nan_and_nodata_promoted() {
        let january = array![[-9999.0_f32, 1.0], [f32::NAN, 3.0]];
        let february = array![[-9999.0_f32, 2.0], [f32::NAN, 5.0]];

        let stack = RasterStack::new(vec![
            (january, test_profile(Some(-9999.0))),
            (february, test_profile(Some(-9999.0))),
        ])
        .unwrap();

        let composite = TemporalAverager::new().average(&stack).unwrap();

        // No finite sentinel survives: the dead pixels are NaN, not -9999
        assert!(composite.data[[0, 0]].is_nan());
        assert!(composite.data[[1, 0]].is_nan());
        assert_abs_diff_eq!(composite.data[[0, 1]], 1.5, epsilon = 1e-6);
        assert_abs_diff_eq!(composite.data[[1, 1]], 4.0, epsilon = 1e-6);
        assert!(composite.profile.nodata.unwrap().is_nan());
        assert_eq!(composite.coverage.min_months, 0);
        assert_eq!(composite.coverage.max_months, 2);
    }

    #[test]
    fn test_fallback_nodata_when_source_declares_none() {
        let january = array![[-9999.0_f32, 4.0], [6.0, 8.0]];
        let stack = RasterStack::new(vec![(january, test_profile(None))]).unwrap();

        let composite = TemporalAverager::new().average(&stack).unwrap();
        assert!(composite.data[[0, 0]].is_nan());
        assert_abs_diff_eq!(composite.data[[0, 1]], 4.0, epsilon = 1e-6);

        // A custom sentinel keeps -9999 as a real value
        let january = array![[-9999.0_f32, 4.0], [6.0, 8.0]];
        let stack = RasterStack::new(vec![(january, test_profile(None))]).unwrap();
        let averager = TemporalAverager::with_params(AverageParams {
            fallback_nodata: -1.0,
        });
        let composite = averager.average(&stack).unwrap();
        assert_abs_diff_eq!(composite.data[[0, 0]], -9999.0, epsilon = 1e-3);
    }

    #[test]
    fn test_mismatched_geometry_is_rejected() {
        let january = array![[1.0_f32, 2.0], [3.0, 4.0]];
        let february = array![[1.0_f32, 2.0], [3.0, 4.0]];
        let mut shifted = test_profile(Some(-9999.0));
        shifted.geo_transform.top_left_x += 30.0;

        let result = RasterStack::new(vec![
            (january, test_profile(Some(-9999.0))),
            (february, shifted),
        ]);

        assert!(matches!(result, Err(LstError::GeometryMismatch(_))));
    }
}
