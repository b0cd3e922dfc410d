//! Height-field texture synthesis.
//!
//! Turns a coarse grid of elevation samples into a smooth grayscale RGBA8
//! texture. The grid is optionally resampled to a target resolution, then
//! upsampled by an integer detail factor. Both passes use bilinear
//! interpolation with neighbour indices clamped to the last row and column.
//! The result is min-max normalised and inverted so that low ground is white
//! and high ground is black.
//!
//! Synthesis is meant to run once per map load, never on the snapshot path.

use ordered_float::OrderedFloat;
use thiserror::Error;

/// Errors produced while building a height grid or texture.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TerrainError {
    /// The grid has no rows or its first row has no samples.
    #[error("height grid is empty")]
    Empty,
    /// A row's length differs from the first row's.
    #[error("height grid row {row} has {found} samples, expected {expected}")]
    Ragged {
        /// Index of the offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// A sample is NaN or infinite.
    #[error("height sample at ({x}, {y}) is not finite")]
    NonFinite {
        /// Column of the sample.
        x: usize,
        /// Row of the sample.
        y: usize,
    },
    /// The detail factor or a target dimension is zero.
    #[error("resampling dimension must be non-zero")]
    ZeroDimension,
}

/// Rectangular grid of elevations, origin top-left, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightGrid {
    width: usize,
    height: usize,
    samples: Vec<f32>,
}

impl HeightGrid {
    /// Builds a grid from rows of samples.
    ///
    /// # Errors
    /// Returns [`TerrainError`] when the rows are empty, ragged, or hold a
    /// non-finite sample.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self, TerrainError> {
        let width = rows.first().map_or(0, |row| row.as_ref().len());
        if width == 0 {
            return Err(TerrainError::Empty);
        }
        let mut samples = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(TerrainError::Ragged {
                    row: y,
                    expected: width,
                    found: row.len(),
                });
            }
            if let Some(x) = row.iter().position(|v| !v.is_finite()) {
                return Err(TerrainError::NonFinite { x, y });
            }
            samples.extend_from_slice(row);
        }
        Ok(Self {
            width,
            height: rows.len(),
            samples,
        })
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Sample at `(x, y)` with both indices clamped into the grid.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        let cx = x.min(self.width - 1);
        let cy = y.min(self.height - 1);
        self.samples
            .get(cy * self.width + cx)
            .copied()
            .unwrap_or_default()
    }

    /// Smallest and largest sample.
    #[must_use]
    pub fn range(&self) -> (f32, f32) {
        let iter = self.samples.iter().copied().map(OrderedFloat);
        let min = iter.clone().min().map_or(0.0, OrderedFloat::into_inner);
        let max = iter.max().map_or(0.0, OrderedFloat::into_inner);
        (min, max)
    }

    /// Bilinear interpolation at fractional source coordinates.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        reason = "coordinates are non-negative and floored before indexing a small grid"
    )]
    fn bilinear(&self, src_x: f32, src_y: f32) -> f32 {
        let x0 = (src_x.max(0.0).floor() as usize).min(self.width - 1);
        let y0 = (src_y.max(0.0).floor() as usize).min(self.height - 1);
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = (src_x - x0 as f32).clamp(0.0, 1.0);
        let fy = (src_y - y0 as f32).clamp(0.0, 1.0);

        let q11 = self.get(x0, y0);
        let q21 = self.get(x1, y0);
        let q12 = self.get(x0, y1);
        let q22 = self.get(x1, y1);

        q11 * (1.0 - fx) * (1.0 - fy) + q21 * fx * (1.0 - fy) + q12 * (1.0 - fx) * fy + q22 * fx * fy
    }

    fn generate(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut samples = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                samples.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            samples,
        }
    }
}

/// Resamples a grid to `target_width` × `target_height`.
///
/// Source coordinates are `x * width / target_width` on each axis.
///
/// # Errors
/// Returns [`TerrainError::ZeroDimension`] when a target side is zero.
#[expect(
    clippy::cast_precision_loss,
    reason = "grid dimensions are small and exactly representable"
)]
pub fn resample(
    grid: &HeightGrid,
    target_width: usize,
    target_height: usize,
) -> Result<HeightGrid, TerrainError> {
    if target_width == 0 || target_height == 0 {
        return Err(TerrainError::ZeroDimension);
    }
    let sx = grid.width as f32 / target_width as f32;
    let sy = grid.height as f32 / target_height as f32;
    Ok(HeightGrid::generate(target_width, target_height, |x, y| {
        grid.bilinear(x as f32 * sx, y as f32 * sy)
    }))
}

/// Upsamples a grid by an integer factor on both axes.
///
/// Output cell `(x, y)` samples the source at `(x / factor, y / factor)`, so
/// every original sample is reproduced exactly at multiples of `factor`.
///
/// # Errors
/// Returns [`TerrainError::ZeroDimension`] when `factor` is zero.
#[expect(
    clippy::cast_precision_loss,
    reason = "grid dimensions are small and exactly representable"
)]
pub fn refine(grid: &HeightGrid, factor: u32) -> Result<HeightGrid, TerrainError> {
    if factor == 0 {
        return Err(TerrainError::ZeroDimension);
    }
    let factor_f = factor as f32;
    let scale = factor as usize;
    Ok(HeightGrid::generate(
        grid.width * scale,
        grid.height * scale,
        |x, y| grid.bilinear(x as f32 / factor_f, y as f32 / factor_f),
    ))
}

/// Grayscale RGBA8 raster, row-major from the top-left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterTexture {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes of RGBA.
    pub data: Vec<u8>,
}

impl RasterTexture {
    /// Gray level of the pixel at `(x, y)`, if inside the raster.
    #[must_use]
    pub fn gray_at(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y as usize * self.width as usize + x as usize) * 4;
        self.data.get(index).copied()
    }

    /// Iterates over the RGBA quadruples.
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(4)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "the value is clamped into 0..=255 before casting"
)]
fn gray_level(normalised: f32) -> u8 {
    (255.0 * (1.0 - normalised)).round().clamp(0.0, 255.0) as u8
}

/// Whether a `(min, max)` range is too narrow to normalise.
///
/// The tolerance is relative to the magnitude of the samples, so round-off
/// left by interpolating a flat grid of large values still counts as flat.
fn is_flat((min, max): (f32, f32)) -> bool {
    let magnitude = min.abs().max(max.abs()).max(1.0);
    max - min <= f32::EPSILON * magnitude
}

/// Normalises a grid to `[0, 1]`, inverts it and packs it as RGBA8.
///
/// A flat grid has no range to normalise; every pixel is then white.
#[must_use]
pub fn to_texture(grid: &HeightGrid) -> RasterTexture {
    pack(grid, is_flat(grid.range()))
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "texture dimensions derive from small grids"
)]
fn pack(grid: &HeightGrid, flat: bool) -> RasterTexture {
    let (min, max) = grid.range();
    let span = max - min;
    let mut data = Vec::with_capacity(grid.samples.len() * 4);
    for &value in &grid.samples {
        let normalised = if flat { 0.0 } else { (value - min) / span };
        let gray = gray_level(normalised);
        data.extend_from_slice(&[gray, gray, gray, u8::MAX]);
    }
    RasterTexture {
        width: grid.width as u32,
        height: grid.height as u32,
        data,
    }
}

/// Builds the terrain texture from raw elevation samples.
///
/// When `target` is supplied the grid is first resampled to that
/// resolution, then refined by `detail_factor`. Flatness is judged on the
/// raw samples, so a flat input always yields a uniformly white texture.
///
/// # Errors
/// Returns [`TerrainError::ZeroDimension`] for a zero factor or target side.
///
/// # Examples
///
/// ```
/// use swarm_view::terrain::{synthesize, HeightGrid};
///
/// let grid = HeightGrid::from_rows(&[[0.0_f32, 1.0], [1.0, 2.0]]).unwrap();
/// let texture = synthesize(&grid, 4, None).unwrap();
/// assert_eq!((texture.width, texture.height), (8, 8));
/// assert_eq!(texture.gray_at(0, 0), Some(255));
/// ```
pub fn synthesize(
    grid: &HeightGrid,
    detail_factor: u32,
    target: Option<(usize, usize)>,
) -> Result<RasterTexture, TerrainError> {
    let refined = match target {
        Some((width, height)) => refine(&resample(grid, width, height)?, detail_factor)?,
        None => refine(grid, detail_factor)?,
    };
    Ok(pack(&refined, is_flat(grid.range())))
}
