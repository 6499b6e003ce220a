//! Domain types providing compile-time safety and self-documentation
//!
//! Trace data is measured in microseconds and activation data in
//! milliseconds. These wrappers keep the two from being mixed up when
//! formatting for display.

use std::fmt;

/// Duration in microseconds (trace time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Micros(pub u64);

impl Micros {
    /// Convert to milliseconds (f64)
    #[allow(clippy::cast_precision_loss)]
    pub fn as_millis(self) -> f64 {
        self.0 as f64 / 1_000.0
    }

    /// Convert to seconds (f64)
    #[allow(clippy::cast_precision_loss)]
    pub fn as_seconds(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Share of `total` as a percentage (0.0 when `total` is zero)
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage_of(self, total: Micros) -> f64 {
        if total.0 == 0 {
            0.0
        } else {
            (self.0 as f64 / total.0 as f64) * 100.0
        }
    }
}

impl fmt::Display for Micros {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.as_millis();
        if ms >= 1000.0 {
            write!(f, "{:.2}s", self.as_seconds())
        } else {
            write!(f, "{ms:.2}ms")
        }
    }
}

/// Duration in milliseconds (activation time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Millis(pub u64);

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_micros_conversions() {
        let dur = Micros(1_500_000);
        assert_eq!(dur.as_millis(), 1500.0);
        assert_eq!(dur.as_seconds(), 1.5);
    }

    #[test]
    fn test_micros_display() {
        assert_eq!(Micros(5_000).to_string(), "5.00ms");
        assert_eq!(Micros(1_500_000).to_string(), "1.50s");
    }

    #[test]
    fn test_percentage_of_zero_total() {
        assert_eq!(Micros(10).percentage_of(Micros(0)), 0.0);
        assert!((Micros(1).percentage_of(Micros(4)) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_millis_display() {
        assert_eq!(Millis(42).to_string(), "42ms");
    }
}
