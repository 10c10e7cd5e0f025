use rand::Rng;

/// Decide whether the current exchange should be logged.
///
/// One uniform draw per call, no allocation. Rates at or beyond the
/// endpoints short-circuit without touching the RNG, so always-on
/// (rate = 1.0) and disabled (rate = 0.0) logging are deterministic.
#[inline]
pub fn should_sample(rate: f64) -> bool {
    if rate >= 1.0 {
        return true;
    }
    if rate <= 0.0 {
        return false;
    }
    rand::thread_rng().gen::<f64>() < rate
}
