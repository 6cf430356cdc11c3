use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

/// REFERENCE: [7.3.3 Numeric objects, p24-25]
/// The lexical form is kept so integers are written back as integers.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Integer(i64),
    Real(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Integer(value) => value as f64,
            Self::Real(value) => value,
        }
    }

    /// The integer value, if the number has no fractional part
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Integer(value) => Some(value),
            Self::Real(value)
                if value.fract() == 0.0 && value >= i64::MIN as f64 && value <= i64::MAX as f64 =>
            {
                Some(value as i64)
            }
            Self::Real(_) => None,
        }
    }
}

/// Numbers compare by value: `1` equals `1.0`.
impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(lhs), Self::Integer(rhs)) => lhs == rhs,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match *self {
            Self::Integer(value) => write!(f, "{}", value),
            // REFERENCE: [7.3.3 Numeric objects, p25]
            // Exponential notation is not allowed. `f64`'s `Display` never
            // uses it, but it prints `NaN` and `inf`.
            Self::Real(value) if !value.is_finite() => write!(f, "0"),
            Self::Real(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", value as i64)
            }
            Self::Real(value) => write!(f, "{}", value),
        }
    }
}

mod convert {
    use super::*;

    impl From<i64> for Number {
        fn from(value: i64) -> Self {
            Self::Integer(value)
        }
    }

    impl From<usize> for Number {
        fn from(value: usize) -> Self {
            i64::try_from(value)
                .map(Self::Integer)
                .unwrap_or(Self::Real(value as f64))
        }
    }

    impl From<f64> for Number {
        fn from(value: f64) -> Self {
            Self::Real(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_display() {
        assert_eq!(Number::Integer(-12).to_string(), "-12");
        assert_eq!(Number::Real(1.5).to_string(), "1.5");
        assert_eq!(Number::Real(-0.25).to_string(), "-0.25");
        assert_eq!(Number::Real(3.0).to_string(), "3");
        assert_eq!(Number::Real(0.0000001).to_string(), "0.0000001");
        assert_eq!(Number::Real(f64::NAN).to_string(), "0");
    }

    #[test]
    fn number_equality() {
        assert_eq!(Number::Integer(1), Number::Real(1.0));
        assert_ne!(Number::Integer(1), Number::Real(1.5));
        assert_eq!(Number::Real(2.0).as_i64(), Some(2));
        assert_eq!(Number::Real(2.5).as_i64(), None);
    }
}
