//! Scoped floating-point mode.
//!
//! Constant folding in the semantic and IR passes must round the same way no
//! matter what the embedding process configured, so every toolchain entry
//! point installs a deterministic mode for its duration and hands the
//! caller's mode back when it returns.
//!
//! The mode is kept in a thread-local environment. The toolchain does not
//! touch hardware float state itself: a pass that folds floating-point values
//! reads the installed mode through [`current`] and rounds accordingly. The
//! bundled outline passes fold nothing and never read it. Guards nest: an
//! inner guard restores whatever the outer guard installed.

use std::cell::RefCell;
use std::marker::PhantomData;

/// IEEE-754 rounding direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingMode {
    #[default]
    NearestTiesToEven,
    TowardZero,
    TowardPositive,
    TowardNegative,
}

/// Floating-point control state for the current thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FloatMode {
    pub rounding: RoundingMode,
    /// Flush denormal results (and inputs) to zero.
    pub flush_to_zero: bool,
}

impl FloatMode {
    /// The mode every pipeline stage runs under.
    pub const DETERMINISTIC: FloatMode = FloatMode {
        rounding: RoundingMode::NearestTiesToEven,
        flush_to_zero: false,
    };
}

thread_local! {
    static MODE: RefCell<FloatMode> = RefCell::new(FloatMode::default());
}

/// The mode currently installed on this thread.
pub fn current() -> FloatMode {
    MODE.with(|mode| *mode.borrow())
}

/// Install `mode` on this thread, returning the mode it replaced.
pub fn set(mode: FloatMode) -> FloatMode {
    MODE.with(|slot| std::mem::replace(&mut *slot.borrow_mut(), mode))
}

/// Restores the previously installed mode when dropped.
///
/// The guard is `!Send`: it must be dropped on the thread that created it.
#[must_use = "the previous mode is restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct FloatModeGuard {
    previous: FloatMode,
    _not_send: PhantomData<*const ()>,
}

impl FloatModeGuard {
    /// Install [`FloatMode::DETERMINISTIC`] until the guard is dropped.
    pub fn deterministic() -> Self {
        Self::install(FloatMode::DETERMINISTIC)
    }

    /// Install an arbitrary mode until the guard is dropped.
    pub fn install(mode: FloatMode) -> Self {
        let previous = set(mode);
        FloatModeGuard {
            previous,
            _not_send: PhantomData,
        }
    }

    /// The mode that will be restored.
    pub fn previous(&self) -> FloatMode {
        self.previous
    }
}

impl Drop for FloatModeGuard {
    fn drop(&mut self) {
        set(self.previous);
    }
}
