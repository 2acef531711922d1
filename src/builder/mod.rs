//! Script-emission building blocks shared by every compiler layer.

pub mod budget;
pub mod ops;

/// The five orthogonal knobs every field/curve operation accepts.
///
/// - `take_modulo`: append the batched-modulo pattern so each result
///   component is reduced modulo `q`.
/// - `positive_modulo`: when reducing, map into `[0, q)` rather than
///   `(-q, q)`.
/// - `check_constant`: prepend [`ops::verify_bottom_constant`].
/// - `clean_constant`: remove `q` from the stack bottom while fetching it.
/// - `is_constant_reused`: leave `q` directly below the top result
///   component so the next operation can reuse it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpFlags {
    pub take_modulo: bool,
    pub positive_modulo: bool,
    pub check_constant: bool,
    pub clean_constant: bool,
    pub is_constant_reused: bool,
}

impl Default for OpFlags {
    fn default() -> Self {
        Self {
            take_modulo: false,
            positive_modulo: true,
            check_constant: false,
            clean_constant: false,
            is_constant_reused: false,
        }
    }
}

impl OpFlags {
    /// No reduction, no constant handling.
    pub fn bare() -> Self {
        Self::default()
    }

    /// Reduce into the canonical positive range.
    pub fn reduce() -> Self {
        Self {
            take_modulo: true,
            ..Self::default()
        }
    }

    /// Reduce and drop `q` from the bottom of the stack.
    pub fn reduce_and_clean() -> Self {
        Self {
            take_modulo: true,
            clean_constant: true,
            ..Self::default()
        }
    }

    pub fn with_check_constant(mut self, check: bool) -> Self {
        self.check_constant = check;
        self
    }

    pub fn with_clean_constant(mut self, clean: bool) -> Self {
        self.clean_constant = clean;
        self
    }

    pub fn with_constant_reused(mut self, reused: bool) -> Self {
        self.is_constant_reused = reused;
        self
    }

    pub fn with_positive_modulo(mut self, positive: bool) -> Self {
        self.positive_modulo = positive;
        self
    }
}
