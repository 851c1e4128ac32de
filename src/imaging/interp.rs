use crate::foundation::pixel::Pixel;
use crate::imaging::raster::Raster;

/// Bicubic convolution kernel parameter (Keys, a = -1/2).
const A: f64 = -0.5;

/// Bicubic interpolation over one channel plane.
#[derive(Clone, Debug)]
pub(crate) struct BicubicInterpolator {
    width: usize,
    height: usize,
    plane: Vec<f64>,
}

impl BicubicInterpolator {
    pub(crate) fn new(raster: &Raster, channel: usize) -> Self {
        Self {
            width: raster.width() as usize,
            height: raster.height() as usize,
            plane: raster.plane(channel),
        }
    }

    #[inline]
    fn at(&self, x: isize, y: isize) -> f64 {
        let x = x.clamp(0, self.width as isize - 1) as usize;
        let y = y.clamp(0, self.height as isize - 1) as usize;
        self.plane[y * self.width + x]
    }

    /// Interpolated value at fractional coordinates; pixel centres sit on integer coordinates and
    /// borders are extended by replication.
    pub(crate) fn sample(&self, fx: f64, fy: f64) -> f64 {
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (ix, iy) = (x0 as isize, y0 as isize);
        let wx = weights(tx);
        let wy = weights(ty);
        let mut acc = 0.0;
        for (j, wyj) in wy.iter().enumerate() {
            let yy = iy - 1 + j as isize;
            let mut row = 0.0;
            for (i, wxi) in wx.iter().enumerate() {
                row += wxi * self.at(ix - 1 + i as isize, yy);
            }
            acc += wyj * row;
        }
        acc
    }
}

fn kernel(d: f64) -> f64 {
    let d = d.abs();
    if d <= 1.0 {
        ((A + 2.0) * d - (A + 3.0)) * d * d + 1.0
    } else if d < 2.0 {
        ((A * d - 5.0 * A) * d + 8.0 * A) * d - 4.0 * A
    } else {
        0.0
    }
}

fn weights(t: f64) -> [f64; 4] {
    [kernel(1.0 + t), kernel(t), kernel(1.0 - t), kernel(2.0 - t)]
}

/// Per-channel interpolators for one image, built once per compiled program and shared read-only
/// by every worker.
#[derive(Clone, Debug)]
pub(crate) struct ImageInterpolation {
    channels: Vec<BicubicInterpolator>,
    color: bool,
}

impl ImageInterpolation {
    pub(crate) fn new(raster: &Raster) -> Self {
        Self {
            channels: (0..raster.channels())
                .map(|c| BicubicInterpolator::new(raster, c))
                .collect(),
            color: raster.is_color(),
        }
    }

    pub(crate) fn sample(&self, c: usize, fx: f64, fy: f64) -> f64 {
        self.channels[c].sample(fx, fy)
    }

    /// Interpolated nominal pixel: RGB for colour images, gray otherwise.
    pub(crate) fn pixel(&self, fx: f64, fy: f64) -> Pixel {
        if self.color {
            Pixel::rgb(
                self.sample(0, fx, fy),
                self.sample(1, fx, fy),
                self.sample(2, fx, fy),
            )
        } else {
            Pixel::gray(self.sample(0, fx, fy))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/imaging/interp.rs"]
mod tests;
