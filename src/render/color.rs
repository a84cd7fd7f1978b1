use rayon::prelude::*;

use super::palette::Palette;
use crate::engine::stats::DbRange;

/// Displayed dynamic range in dB when the configured value is missing or
/// out of range.
pub const DEFAULT_RANGE_DB: f64 = 100.0;

/// The dB window mapped onto the palette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormBounds {
    pub max_db: f64,
    pub min_db: f64,
}

impl NormBounds {
    /// Resolve the normalization window for a render.
    ///
    /// The ceiling is the observed peak when normalizing, else the
    /// configured ceiling, else the sample type's full scale. The span
    /// below the ceiling must land in (0, 1000] dB or the default is
    /// used.
    pub fn resolve(
        normalize: bool,
        observed: Option<DbRange>,
        max_db: Option<f64>,
        full_scale_db: f64,
        range_db: f64,
    ) -> NormBounds {
        let range = if range_db.is_finite() && range_db > 0.0 && range_db <= 1000.0 {
            range_db
        } else {
            DEFAULT_RANGE_DB
        };
        let max = if normalize {
            observed.map(|r| r.max_db).unwrap_or(full_scale_db)
        } else {
            max_db.unwrap_or(full_scale_db)
        };
        NormBounds {
            max_db: max,
            min_db: max - range,
        }
    }

    /// Palette index for one dB value; the ceiling maps to the hot end.
    #[inline]
    pub fn index(&self, db: f64) -> u8 {
        let norm = ((db - self.min_db) / (self.max_db - self.min_db)).clamp(0.0, 1.0);
        ((1.0 - norm) * 255.0).round() as u8
    }
}

/// Convert the magnitude grid to packed RGB, one pixel per cell,
/// window-major. Rows are independent, so they convert in parallel.
pub fn grid_to_rgb(grid: &[f64], fft_size: usize, bounds: NormBounds, palette: &Palette) -> Vec<u8> {
    let mut rgb = vec![0u8; grid.len() * 3];
    if fft_size == 0 {
        return rgb;
    }
    rgb.par_chunks_mut(3 * fft_size)
        .zip(grid.par_chunks(fft_size))
        .for_each(|(out_row, db_row)| {
            for (out, &db) in out_row.chunks_exact_mut(3).zip(db_row) {
                out.copy_from_slice(&palette.color(bounds.index(db)));
            }
        });
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_ceiling_wins_when_not_normalizing() {
        let observed = Some(DbRange { min_db: -80.0, max_db: -12.0 });
        let b = NormBounds::resolve(false, observed, Some(10.0), 90.0, 60.0);
        assert_eq!(b.max_db, 10.0);
        assert_eq!(b.min_db, -50.0);
    }

    #[test]
    fn normalizing_uses_the_observed_peak() {
        let observed = Some(DbRange { min_db: -80.0, max_db: -12.5 });
        let b = NormBounds::resolve(true, observed, Some(10.0), 90.0, 100.0);
        assert_eq!(b.max_db, -12.5);
        assert_eq!(b.min_db, -112.5);
    }

    #[test]
    fn full_scale_is_the_fallback_ceiling() {
        let b = NormBounds::resolve(false, None, None, 90.3, 100.0);
        assert_eq!(b.max_db, 90.3);
        let b = NormBounds::resolve(true, None, None, 90.3, 100.0);
        assert_eq!(b.max_db, 90.3);
    }

    #[test]
    fn out_of_range_span_falls_back_to_default() {
        for bad in [0.0, -5.0, 1000.5, f64::NAN, f64::INFINITY] {
            let b = NormBounds::resolve(false, None, Some(0.0), 0.0, bad);
            assert_eq!(b.min_db, -DEFAULT_RANGE_DB, "range {}", bad);
        }
        let b = NormBounds::resolve(false, None, Some(0.0), 0.0, 1000.0);
        assert_eq!(b.min_db, -1000.0);
    }

    #[test]
    fn index_inverts_and_clamps() {
        let b = NormBounds { max_db: 0.0, min_db: -100.0 };
        assert_eq!(b.index(0.0), 0);
        assert_eq!(b.index(250.0), 0);
        assert_eq!(b.index(-100.0), 255);
        assert_eq!(b.index(-300.0), 255);
        assert_eq!(b.index(f64::NEG_INFINITY), 255);
        assert_eq!(b.index(-50.0), 128);
    }

    #[test]
    fn rendering_is_deterministic() {
        let grid: Vec<f64> = (0..64).map(|i| -(i as f64) * 1.7).collect();
        let bounds = NormBounds { max_db: 0.0, min_db: -100.0 };
        let palette = Palette::heat();
        let a = grid_to_rgb(&grid, 8, bounds, &palette);
        let b = grid_to_rgb(&grid, 8, bounds, &palette);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64 * 3);
    }

    #[test]
    fn louder_cells_use_hotter_palette_entries() {
        let bounds = NormBounds { max_db: 0.0, min_db: -100.0 };
        let palette = Palette::heat();
        let rgb = grid_to_rgb(&[-5.0, -95.0], 2, bounds, &palette);
        assert_eq!(&rgb[0..3], &palette.color(bounds.index(-5.0))[..]);
        assert!(bounds.index(-5.0) < bounds.index(-95.0));
    }
}
