use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use uom::si::frequency::hertz;
use uom::si::u64;

/// An exact-integer frequency in Hz.
///
/// The planner's quantization (tuning grid, step size, overlap) has to land on
/// the same integer Hz the device does; a float-backed frequency would drift
/// off that grid after a handful of additions. Every frequency that crosses a
/// module boundary in this crate goes through this type instead of a bare
/// `u64` so a Hz/kHz mixup is a type error rather than a silent factor-of-1000
/// bug.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Frequency {
    freq: u64::Frequency,
}

impl Frequency {
    pub fn zero() -> Frequency {
        Frequency::from_hz(0)
    }

    pub fn from_hz(hz: u64) -> Frequency {
        Frequency {
            freq: u64::Frequency::new::<hertz>(hz),
        }
    }

    pub fn as_hz(&self) -> u64 {
        self.freq.get::<hertz>()
    }

    pub fn checked_sub(self, rhs: Frequency) -> Option<Frequency> {
        self.as_hz()
            .checked_sub(rhs.as_hz())
            .map(Frequency::from_hz)
    }

    /// Rounds down to the nearest multiple of `grid` (0 is left as 0).
    pub fn quantize_down(self, grid: Frequency) -> Frequency {
        if grid.as_hz() == 0 {
            return self;
        }
        Frequency::from_hz((self.as_hz() / grid.as_hz()) * grid.as_hz())
    }

    /// Rounds up to the nearest multiple of `grid`.
    pub fn quantize_up(self, grid: Frequency) -> Frequency {
        if grid.as_hz() == 0 {
            return self;
        }
        let g = grid.as_hz();
        let hz = self.as_hz();
        Frequency::from_hz(((hz + g - 1) / g) * g)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.as_hz())
    }
}

impl Add for Frequency {
    type Output = Frequency;

    fn add(self, rhs: Frequency) -> Self::Output {
        Frequency {
            freq: self.freq + rhs.freq,
        }
    }
}

impl Sub for Frequency {
    type Output = Frequency;

    fn sub(self, rhs: Frequency) -> Self::Output {
        if self < rhs {
            panic!("cannot subtract a larger frequency from a smaller frequency");
        }

        Frequency {
            freq: self.freq - rhs.freq,
        }
    }
}

impl Mul<u64> for Frequency {
    type Output = Frequency;

    fn mul(self, rhs: u64) -> Self::Output {
        Frequency {
            freq: self.freq * rhs,
        }
    }
}

impl Div<u64> for Frequency {
    type Output = Frequency;

    fn div(self, rhs: u64) -> Self::Output {
        if rhs == 0 {
            panic!("cannot divide a frequency by zero");
        }

        Frequency {
            freq: self.freq / rhs,
        }
    }
}

impl From<u64> for Frequency {
    fn from(freq_hz: u64) -> Self {
        Frequency::from_hz(freq_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_hz() {
        let f = Frequency::from_hz(2_450_000_000);
        assert_eq!(f.as_hz(), 2_450_000_000);
    }

    #[test]
    fn quantizes_down_to_grid() {
        let f = Frequency::from_hz(2_450_123_456);
        let grid = Frequency::from_hz(1_000);
        assert_eq!(f.quantize_down(grid).as_hz(), 2_450_123_000);
    }

    #[test]
    fn quantizes_up_to_grid() {
        let f = Frequency::from_hz(2_450_123_001);
        let grid = Frequency::from_hz(1_000);
        assert_eq!(f.quantize_up(grid).as_hz(), 2_450_124_000);
    }

    #[test]
    fn quantize_is_noop_on_exact_multiple() {
        let f = Frequency::from_hz(2_450_000_000);
        let grid = Frequency::from_hz(1_000);
        assert_eq!(f.quantize_down(grid), f);
        assert_eq!(f.quantize_up(grid), f);
    }

    #[test]
    fn arithmetic() {
        let a = Frequency::from_hz(1_000_000);
        let b = Frequency::from_hz(400_000);
        assert_eq!((a - b).as_hz(), 600_000);
        assert_eq!((a + b).as_hz(), 1_400_000);
        assert_eq!((a * 3).as_hz(), 3_000_000);
        assert_eq!((a / 4).as_hz(), 250_000);
    }
}
