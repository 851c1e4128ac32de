use std::fmt;

/// A 1-channel (gray/scalar) or 3-channel (RGB) double precision pixel value.
///
/// Gray pixels keep their value in channel 0; reading any channel of a gray pixel returns that
/// value, which is how scalars promote against colour operands.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Pixel {
    samples: [f64; 3],
    color: bool,
}

impl Pixel {
    /// Gray pixel.
    pub const fn gray(v: f64) -> Self {
        Self {
            samples: [v, v, v],
            color: false,
        }
    }

    /// RGB pixel.
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self {
            samples: [r, g, b],
            color: true,
        }
    }

    /// Build from 1 or 3 samples.
    pub fn from_samples(s: &[f64]) -> Option<Self> {
        match *s {
            [v] => Some(Self::gray(v)),
            [r, g, b] => Some(Self::rgb(r, g, b)),
            _ => None,
        }
    }

    /// `true` for 3-channel pixels.
    pub fn is_color(&self) -> bool {
        self.color
    }

    /// Number of channels (1 or 3).
    pub fn len(&self) -> usize {
        if self.color { 3 } else { 1 }
    }

    /// Pixels always carry at least one channel.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Channel `c` of a colour pixel, channel 0 of a gray one.
    ///
    /// Channels past the last RGB component read channel 0.
    #[inline]
    pub fn get(&self, c: usize) -> f64 {
        if self.color && c < 3 {
            self.samples[c]
        } else {
            self.samples[0]
        }
    }

    /// Set channel `c`; out-of-range channels are ignored.
    #[inline]
    pub fn set(&mut self, c: usize, v: f64) {
        if !self.color {
            if c == 0 {
                self.samples = [v; 3];
            }
        } else if c < 3 {
            self.samples[c] = v;
        }
    }

    /// The meaningful samples (1 or 3).
    pub fn samples(&self) -> &[f64] {
        &self.samples[..self.len()]
    }

    /// Replace the value with a gray `v`.
    pub fn set_gray(&mut self, v: f64) {
        *self = Self::gray(v);
    }

    /// Replicate channel 0 into three channels. Colour pixels are returned unchanged.
    pub fn to_color(self) -> Self {
        if self.color {
            self
        } else {
            Self::rgb(self.samples[0], self.samples[0], self.samples[0])
        }
    }

    /// Zero pixel shaped as gray (`color == false`) or RGB.
    pub(crate) fn shaped(color: bool) -> Self {
        if color {
            Self::rgb(0.0, 0.0, 0.0)
        } else {
            Self::gray(0.0)
        }
    }

    /// `true` when channel `c` evaluates to logical false.
    #[inline]
    pub fn is_logical_zero(&self, c: usize) -> bool {
        self.get(c) == 0.0
    }

    /// `true` when channel `c` evaluates to logical true.
    #[inline]
    pub fn is_logical_one(&self, c: usize) -> bool {
        !self.is_logical_zero(c)
    }

    /// Apply `f` to every channel of `self` and write the results into `out`'s channels.
    pub(crate) fn fill(out: &mut Pixel, mut f: impl FnMut(usize) -> f64) {
        if out.color {
            for c in 0..3 {
                out.samples[c] = f(c);
            }
        } else {
            out.samples = [f(0); 3];
        }
    }
}

impl Default for Pixel {
    fn default() -> Self {
        Self::gray(0.0)
    }
}

impl From<f64> for Pixel {
    fn from(v: f64) -> Self {
        Self::gray(v)
    }
}

impl TryFrom<Vec<f64>> for Pixel {
    type Error = String;

    fn try_from(v: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_samples(&v)
            .ok_or_else(|| format!("pixel literal needs 1 or 3 samples, got {}", v.len()))
    }
}

impl From<Pixel> for Vec<f64> {
    fn from(p: Pixel) -> Self {
        p.samples().to_vec()
    }
}

impl fmt::Display for Pixel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.color {
            write!(
                f,
                "{{{}, {}, {}}}",
                self.samples[0], self.samples[1], self.samples[2]
            )
        } else {
            write!(f, "{{{}}}", self.samples[0])
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/pixel.rs"]
mod tests;
