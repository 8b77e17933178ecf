use crate::display::SimpleDisplay;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A floating point request input.
///
/// `f64` has no total equality, so requests compare floats by bit pattern:
/// `0.0` and `-0.0` are different inputs and a NaN equals itself.
#[derive(Debug, Clone, Copy)]
pub struct Real(pub f64);

impl Real {
    pub fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for Real {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Real {}

impl Hash for Real {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.to_bits());
    }
}

impl From<f64> for Real {
    fn from(value: f64) -> Self {
        Real(value)
    }
}

impl SimpleDisplay for Real {
    fn simple_display(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.simple_display(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::display_string;

    #[test]
    fn test_bitwise_equality() {
        assert_eq!(Real(3.0), Real(3.0));
        assert_ne!(Real(0.0), Real(-0.0));
        assert_eq!(Real(f64::NAN), Real(f64::NAN));
    }

    #[test]
    fn test_display_keeps_fraction() {
        assert_eq!(display_string(&Real(3.0)), "3.0");
        assert_eq!(display_string(&(Real(1.5),)), "(1.5)");
    }
}
