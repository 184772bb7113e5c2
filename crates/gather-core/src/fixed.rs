use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Simulation seconds. Every timer in the kitchen counts these down.
pub type Seconds = Fixed64;

/// Steps are the atomic unit of kitchen time (one `Kitchen::step` each).
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display and logging.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Shorthand for a number of seconds. Panics if `v` does not fit; data
/// files go through [`try_secs`].
#[inline]
pub fn secs(v: f64) -> Seconds {
    f64_to_fixed64(v)
}

/// Seconds from untrusted data: `None` when `v` is not finite or does not
/// fit in Q32.32.
#[inline]
pub fn try_secs(v: f64) -> Option<Seconds> {
    if !v.is_finite() {
        return None;
    }
    Fixed64::checked_from_num(v)
}

/// `percent` hundredths of `v`, computed on the raw bits.
#[inline]
pub fn percent_of(v: Fixed64, percent: u8) -> Fixed64 {
    Fixed64::from_bits((i128::from(v.to_bits()) * i128::from(percent) / 100) as i64)
}

/// Fraction `part / whole`, or zero when `whole` is not positive.
#[inline]
pub fn ratio(part: Fixed64, whole: Fixed64) -> Fixed64 {
    if whole <= Fixed64::ZERO {
        return Fixed64::ZERO;
    }
    part.checked_div(whole).unwrap_or(Fixed64::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed64_basic_arithmetic() {
        let a = f64_to_fixed64(1.5);
        let b = f64_to_fixed64(2.0);
        assert_eq!(fixed64_to_f64(a + b), 3.5);
    }

    #[test]
    fn repeated_subtraction_is_exact() {
        let mut timer = secs(5.0);
        let dt = secs(0.25);
        for _ in 0..20 {
            timer -= dt;
        }
        assert_eq!(timer, Fixed64::ZERO);
    }

    #[test]
    fn out_of_range_seconds_are_refused() {
        assert_eq!(try_secs(2.5), Some(secs(2.5)));
        assert_eq!(try_secs(1e10), None);
        assert_eq!(try_secs(-1e12), None);
        assert_eq!(try_secs(f64::NAN), None);
        assert_eq!(try_secs(f64::INFINITY), None);
    }

    #[test]
    fn percent_of_is_exact() {
        assert_eq!(percent_of(secs(100.0), 50), secs(50.0));
        assert_eq!(percent_of(secs(100.0), 10), secs(10.0));
        assert_eq!(percent_of(secs(40.0), 0), Fixed64::ZERO);
        assert_eq!(percent_of(Fixed64::MAX, 100), Fixed64::MAX);
    }

    #[test]
    fn ratio_of_zero_whole_is_zero() {
        assert_eq!(ratio(secs(3.0), Fixed64::ZERO), Fixed64::ZERO);
        assert_eq!(ratio(secs(1.0), secs(4.0)), secs(0.25));
    }
}
