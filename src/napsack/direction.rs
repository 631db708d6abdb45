use crate::heap::{Ascending, Descending, HeapOrder};

/// Where a coordinate sits at the current multiplier, seen from the
/// direction of the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// At the bound the search moves away from. Tracked in the bound heap.
    Bound,

    /// Strictly inside the box. Tracked in the free heap.
    Free,

    /// At the bound the search moves toward. Never revisited.
    Settled,
}

/// One direction of the breakpoint search.
///
/// Lowering the multiplier raises every `x_i - a_i * lambda`, so coordinates
/// go from 0 to free to 1; raising it runs the other way. The two impls
/// differ only in which bound plays which part and in the sense of every
/// comparison.
pub trait ShiftDirection {
    /// Puts the next breakpoint to visit on top.
    type Order: HeapOrder;

    /// What an empty heap reports as its next breakpoint.
    const EXHAUSTED: f64;

    /// Regime of a coordinate whose shifted value is `x_i - a_i * lambda`.
    fn classify(shifted: f64) -> Regime;

    /// Multiplier at which a bound coordinate becomes free.
    fn bound_breakpoint(x: f64, a: f64) -> f64;

    /// Multiplier at which a free coordinate settles.
    fn free_breakpoint(x: f64, a: f64) -> f64;

    /// Share of `asum` owed to a bound coordinate.
    fn bound_weight(a: f64) -> f64;

    /// Share of `asum` owed to a settled coordinate.
    fn settled_weight(a: f64) -> f64;

    /// Change of `asum` when a free coordinate settles.
    fn settle_delta(x: f64, a: f64) -> f64;

    /// Change of `asum` when a bound coordinate becomes free.
    fn release_delta(x: f64, a: f64) -> f64;

    /// The nearer of two breakpoints along the search.
    fn nearer(p: f64, q: f64) -> f64;

    /// Whether `slope` has reached the target.
    fn reached(slope: f64, target: f64) -> bool;

    /// Whether the search has passed `breakpoint` at `lambda`.
    fn passed(breakpoint: f64, lambda: f64) -> bool;
}

/// Lower the multiplier from above the optimum.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decreasing;

/// Raise the multiplier from below the optimum.
#[derive(Debug, Clone, Copy, Default)]
pub struct Increasing;

impl ShiftDirection for Decreasing {
    type Order = Descending;

    const EXHAUSTED: f64 = f64::NEG_INFINITY;

    #[inline]
    fn classify(shifted: f64) -> Regime {
        if shifted < 0.0 {
            Regime::Bound
        } else if shifted < 1.0 {
            Regime::Free
        } else {
            Regime::Settled
        }
    }

    #[inline]
    fn bound_breakpoint(x: f64, a: f64) -> f64 {
        x / a
    }

    #[inline]
    fn free_breakpoint(x: f64, a: f64) -> f64 {
        (x - 1.0) / a
    }

    #[inline]
    fn bound_weight(_a: f64) -> f64 {
        0.0
    }

    #[inline]
    fn settled_weight(a: f64) -> f64 {
        a
    }

    #[inline]
    fn settle_delta(x: f64, a: f64) -> f64 {
        a * (1.0 - x)
    }

    #[inline]
    fn release_delta(x: f64, a: f64) -> f64 {
        a * x
    }

    #[inline]
    fn nearer(p: f64, q: f64) -> f64 {
        p.max(q)
    }

    #[inline]
    fn reached(slope: f64, target: f64) -> bool {
        slope >= target
    }

    #[inline]
    fn passed(breakpoint: f64, lambda: f64) -> bool {
        breakpoint >= lambda
    }
}

impl ShiftDirection for Increasing {
    type Order = Ascending;

    const EXHAUSTED: f64 = f64::INFINITY;

    #[inline]
    fn classify(shifted: f64) -> Regime {
        if shifted > 1.0 {
            Regime::Bound
        } else if shifted > 0.0 {
            Regime::Free
        } else {
            Regime::Settled
        }
    }

    #[inline]
    fn bound_breakpoint(x: f64, a: f64) -> f64 {
        (x - 1.0) / a
    }

    #[inline]
    fn free_breakpoint(x: f64, a: f64) -> f64 {
        x / a
    }

    #[inline]
    fn bound_weight(a: f64) -> f64 {
        a
    }

    #[inline]
    fn settled_weight(_a: f64) -> f64 {
        0.0
    }

    #[inline]
    fn settle_delta(x: f64, a: f64) -> f64 {
        -a * x
    }

    #[inline]
    fn release_delta(x: f64, a: f64) -> f64 {
        a * (x - 1.0)
    }

    #[inline]
    fn nearer(p: f64, q: f64) -> f64 {
        p.min(q)
    }

    #[inline]
    fn reached(slope: f64, target: f64) -> bool {
        slope <= target
    }

    #[inline]
    fn passed(breakpoint: f64, lambda: f64) -> bool {
        breakpoint <= lambda
    }
}
