#![forbid(unsafe_code)]

//! Quintic easing curves.
//!
//! Both curves map a normalized time `t ∈ [0, 1]` to a progress value and
//! clamp out-of-range input, so samplers never see overshoot. `InQuint`
//! accelerates hard from rest (good for exits); `InOutQuint` accelerates
//! then decelerates symmetrically (good for morphs).

/// Ease-in quintic: `t^5`, clamped to `[0, 1]`.
pub fn ease_in_quint(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * t * t * t
}

/// Ease-in-out quintic: `16t^5` below the midpoint, mirrored above it,
/// clamped to `[0, 1]`.
pub fn ease_in_out_quint(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        16.0 * t * t * t * t * t
    } else {
        let inv = -2.0 * t + 2.0;
        1.0 - inv * inv * inv * inv * inv / 2.0
    }
}

/// Easing curve selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    /// Accelerate from rest.
    InQuint,
    /// Accelerate, then decelerate.
    #[default]
    InOutQuint,
}

impl Easing {
    /// Apply the curve to a normalized time.
    #[inline]
    pub fn apply(self, t: f64) -> f64 {
        (self.as_fn())(t)
    }

    /// The curve as a plain function pointer, as consumed by
    /// [`mm_dom::TransitionSpec::easing`].
    pub fn as_fn(self) -> fn(f64) -> f64 {
        match self {
            Self::InQuint => ease_in_quint,
            Self::InOutQuint => ease_in_out_quint,
        }
    }

    /// The closest CSS `cubic-bezier` to the curve, for the `transition`
    /// shorthand written during playback.
    pub fn css(self) -> &'static str {
        match self {
            Self::InQuint => "cubic-bezier(0.64, 0, 0.78, 0)",
            Self::InOutQuint => "cubic-bezier(0.83, 0, 0.17, 1)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints() {
        for easing in [Easing::InQuint, Easing::InOutQuint] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
        }
    }

    #[test]
    fn known_midpoints() {
        assert_eq!(Easing::InQuint.apply(0.5), 1.0 / 32.0);
        assert_eq!(Easing::InOutQuint.apply(0.5), 0.5);
    }

    #[test]
    fn in_out_is_symmetric_about_the_midpoint() {
        for i in 0..=20 {
            let t = f64::from(i) / 20.0;
            let forward = Easing::InOutQuint.apply(t);
            let mirrored = 1.0 - Easing::InOutQuint.apply(1.0 - t);
            assert!((forward - mirrored).abs() < 1e-12, "asymmetric at t={t}");
        }
    }

    #[test]
    fn out_of_range_input_clamps() {
        for easing in [Easing::InQuint, Easing::InOutQuint] {
            assert_eq!(easing.apply(-1.5), 0.0);
            assert_eq!(easing.apply(2.5), 1.0);
        }
    }

    proptest::proptest! {
        #[test]
        fn bounded_and_monotonic(a in 0.0..1.0f64, b in 0.0..1.0f64) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            for easing in [Easing::InQuint, Easing::InOutQuint] {
                let at_lo = easing.apply(lo);
                let at_hi = easing.apply(hi);
                proptest::prop_assert!((0.0..=1.0).contains(&at_lo));
                proptest::prop_assert!((0.0..=1.0).contains(&at_hi));
                proptest::prop_assert!(at_lo <= at_hi);
            }
        }
    }
}
