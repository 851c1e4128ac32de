use crate::foundation::error::{PixelMathError, PixelMathResult};
use crate::foundation::hash::{Fingerprint, StableHasher};
use crate::foundation::pixel::Pixel;

/// A floating-point image with interleaved samples.
///
/// Samples are stored row-major, pixel-interleaved: `data[(y * width + x) * channels + c]`.
/// Colour rasters have three nominal channels, gray rasters one; an optional alpha channel follows
/// the nominal ones.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    channels: usize,
    color: bool,
    data: Vec<f64>,
}

impl Raster {
    /// Allocate a zero-filled raster.
    ///
    /// Allocation failure is reported as a resource error instead of aborting the process.
    pub fn new(width: u32, height: u32, color: bool, alpha: bool) -> PixelMathResult<Self> {
        let channels = usize::from(if color { 3u8 } else { 1 }) + usize::from(alpha);
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(channels))
            .ok_or_else(|| {
                PixelMathError::resource(format!("raster {width}x{height} is too large"))
            })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| {
            PixelMathError::resource(format!(
                "out of memory allocating a {width}x{height}x{channels} raster"
            ))
        })?;
        data.resize(len, 0.0);
        Ok(Self {
            width,
            height,
            channels,
            color,
            data,
        })
    }

    /// Wrap existing interleaved samples.
    pub fn from_samples(
        width: u32,
        height: u32,
        color: bool,
        alpha: bool,
        data: Vec<f64>,
    ) -> PixelMathResult<Self> {
        let channels = usize::from(if color { 3u8 } else { 1 }) + usize::from(alpha);
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(PixelMathError::compile(format!(
                "raster {width}x{height}x{channels} needs {expected} samples, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            color,
            data,
        })
    }

    /// Build a raster by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(
        width: u32,
        height: u32,
        color: bool,
        mut f: impl FnMut(u32, u32) -> Pixel,
    ) -> PixelMathResult<Self> {
        let mut r = Self::new(width, height, color, false)?;
        for y in 0..height {
            for x in 0..width {
                let p = f(x, y);
                for c in 0..r.channels {
                    r.set_sample(x, y, c, p.get(c));
                }
            }
        }
        Ok(r)
    }

    /// A raster with the same shape, filled with zeros.
    pub(crate) fn zeros_like(&self) -> PixelMathResult<Self> {
        Self::new(self.width, self.height, self.color, self.has_alpha())
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total channel count, alpha included.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// 3 for colour rasters, 1 for gray ones.
    pub fn nominal_channels(&self) -> usize {
        if self.color { 3 } else { 1 }
    }

    /// `true` for RGB rasters.
    pub fn is_color(&self) -> bool {
        self.color
    }

    /// `true` when an alpha channel follows the nominal channels.
    pub fn has_alpha(&self) -> bool {
        self.channels > self.nominal_channels()
    }

    /// Interleaved samples.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Samples per row.
    pub fn row_len(&self) -> usize {
        self.width as usize * self.channels
    }

    /// Size of the sample buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<f64>()
    }

    /// `true` when `(x, y)` lies inside the raster.
    pub fn includes(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    #[inline]
    fn index(&self, x: u32, y: u32, c: usize) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels + c
    }

    /// Sample at `(x, y, c)`. Coordinates must be in range.
    #[inline]
    pub fn sample(&self, x: u32, y: u32, c: usize) -> f64 {
        self.data[self.index(x, y, c)]
    }

    /// Write a sample. Coordinates must be in range.
    #[inline]
    pub fn set_sample(&mut self, x: u32, y: u32, c: usize, v: f64) {
        let i = self.index(x, y, c);
        self.data[i] = v;
    }

    /// Nominal pixel value at `(x, y)`: RGB for colour rasters, gray otherwise.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Pixel {
        let i = self.index(x, y, 0);
        if self.color {
            Pixel::rgb(self.data[i], self.data[i + 1], self.data[i + 2])
        } else {
            Pixel::gray(self.data[i])
        }
    }

    /// Copy of channel `c` as a contiguous plane.
    pub(crate) fn plane(&self, c: usize) -> Vec<f64> {
        self.data
            .iter()
            .skip(c)
            .step_by(self.channels)
            .copied()
            .collect()
    }

    /// Compute a statistic over channel `c`.
    pub fn statistic(&self, kind: StatKind, c: usize) -> f64 {
        let plane = self.plane(c);
        kind.compute(&plane)
    }

    /// Statistic as a pixel value.
    ///
    /// With an explicit channel the result is gray; otherwise it is RGB for colour rasters and
    /// gray for gray ones.
    pub fn statistic_pixel(&self, kind: StatKind, channel: Option<usize>) -> Result<Pixel, String> {
        match channel {
            Some(c) if c >= self.channels => Err(format!(
                "channel index out of range: {c} (raster has {} channels)",
                self.channels
            )),
            Some(c) => Ok(Pixel::gray(self.statistic(kind, c))),
            None if self.color => Ok(Pixel::rgb(
                self.statistic(kind, 0),
                self.statistic(kind, 1),
                self.statistic(kind, 2),
            )),
            None => Ok(Pixel::gray(self.statistic(kind, 0))),
        }
    }

    /// Rescale all samples linearly from their current range to `[lo, hi]`.
    ///
    /// A constant raster maps to `lo`.
    pub fn rescale(&mut self, lo: f64, hi: f64) {
        let (min, max) = self
            .data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), &v| {
                (a.min(v), b.max(v))
            });
        if !(min.is_finite() && max.is_finite()) {
            return;
        }
        let span = max - min;
        for v in &mut self.data {
            *v = if span > 0.0 {
                lo + (*v - min) / span * (hi - lo)
            } else {
                lo
            };
        }
    }

    /// Clamp all samples to `[lo, hi]`.
    pub fn truncate(&mut self, lo: f64, hi: f64) {
        for v in &mut self.data {
            *v = v.clamp(lo, hi);
        }
    }

    /// Content fingerprint covering shape and samples.
    pub(crate) fn fingerprint(&self) -> Fingerprint {
        let mut h = StableHasher::new();
        h.write_u32(self.width);
        h.write_u32(self.height);
        h.write_u32(self.channels as u32);
        h.write_u8(u8::from(self.color));
        for &v in &self.data {
            h.write_f64(v);
        }
        h.finish()
    }

    /// Convert a decoded image into a raster with samples in `[0, 1]`.
    pub fn from_dynamic(img: &image::DynamicImage) -> PixelMathResult<Self> {
        let color = img.color().has_color();
        let alpha = img.color().has_alpha();
        let (w, h) = (img.width(), img.height());
        let data: Vec<f64> = match (color, alpha) {
            (true, true) => img.to_rgba16().into_raw(),
            (true, false) => img.to_rgb16().into_raw(),
            (false, true) => img.to_luma_alpha16().into_raw(),
            (false, false) => img.to_luma16().into_raw(),
        }
        .into_iter()
        .map(|v| f64::from(v) / f64::from(u16::MAX))
        .collect();
        Self::from_samples(w, h, color, alpha, data)
    }

    /// Convert to a 16-bit image, clamping samples to `[0, 1]`.
    pub fn to_dynamic(&self) -> PixelMathResult<image::DynamicImage> {
        let raw: Vec<u16> = self
            .data
            .iter()
            .map(|v| (v.clamp(0.0, 1.0) * f64::from(u16::MAX)).round() as u16)
            .collect();
        let (w, h) = (self.width, self.height);
        let bad = || PixelMathError::internal("sample buffer does not match the image shape");
        let img = match (self.color, self.has_alpha()) {
            (true, true) => image::DynamicImage::ImageRgba16(
                image::ImageBuffer::from_raw(w, h, raw).ok_or_else(bad)?,
            ),
            (true, false) => image::DynamicImage::ImageRgb16(
                image::ImageBuffer::from_raw(w, h, raw).ok_or_else(bad)?,
            ),
            (false, true) => image::DynamicImage::ImageLumaA16(
                image::ImageBuffer::from_raw(w, h, raw).ok_or_else(bad)?,
            ),
            (false, false) => image::DynamicImage::ImageLuma16(
                image::ImageBuffer::from_raw(w, h, raw).ok_or_else(bad)?,
            ),
        };
        Ok(img)
    }
}

/// Whole-image statistics available to invariant functions and constant symbols.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatKind {
    /// Smallest sample.
    Minimum,
    /// Largest sample.
    Maximum,
    /// Sum of samples.
    Sum,
    /// Arithmetic mean.
    Mean,
    /// Median (mean of the two central samples for even counts).
    Median,
    /// Sample standard deviation.
    StdDev,
    /// Sample variance.
    Variance,
    /// Median absolute deviation from the median, scaled to be consistent with a normal sigma.
    MedianDev,
    /// Average absolute deviation from the median, scaled to be consistent with a normal sigma.
    AvgDev,
    /// Sum of absolute values.
    Modulus,
    /// Sum of squares.
    SumSquares,
    /// Mean of squares.
    MeanSquares,
}

impl StatKind {
    /// Compute the statistic over `v`. Empty input yields 0.
    pub fn compute(self, v: &[f64]) -> f64 {
        if v.is_empty() {
            return 0.0;
        }
        let n = v.len() as f64;
        match self {
            StatKind::Minimum => v.iter().copied().fold(f64::INFINITY, f64::min),
            StatKind::Maximum => v.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            StatKind::Sum => v.iter().sum(),
            StatKind::Mean => v.iter().sum::<f64>() / n,
            StatKind::Median => median(&mut v.to_vec()),
            StatKind::Variance => variance(v),
            StatKind::StdDev => variance(v).sqrt(),
            StatKind::MedianDev => {
                let m = median(&mut v.to_vec());
                let mut d: Vec<f64> = v.iter().map(|x| (x - m).abs()).collect();
                1.4826 * median(&mut d)
            }
            StatKind::AvgDev => {
                let m = median(&mut v.to_vec());
                1.2533 * v.iter().map(|x| (x - m).abs()).sum::<f64>() / n
            }
            StatKind::Modulus => v.iter().map(|x| x.abs()).sum(),
            StatKind::SumSquares => v.iter().map(|x| x * x).sum(),
            StatKind::MeanSquares => v.iter().map(|x| x * x).sum::<f64>() / n,
        }
    }
}

fn variance(v: &[f64]) -> f64 {
    if v.len() < 2 {
        return 0.0;
    }
    let n = v.len() as f64;
    let mean = v.iter().sum::<f64>() / n;
    v.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0)
}

fn median(v: &mut [f64]) -> f64 {
    let n = v.len();
    let mid = n / 2;
    let (_, hi, _) = v.select_nth_unstable_by(mid, f64::total_cmp);
    let hi = *hi;
    if n % 2 == 1 {
        return hi;
    }
    let lo = v[..mid].iter().copied().fold(f64::NEG_INFINITY, f64::max);
    0.5 * (lo + hi)
}

#[cfg(test)]
#[path = "../../tests/unit/imaging/raster.rs"]
mod tests;
