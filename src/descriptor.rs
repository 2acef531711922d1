//! Stack-element descriptors.
//!
//! A descriptor is a compile-time record of where an operand lives on
//! the execution-time stack: its distance from the top, how many
//! consecutive slots it occupies, whether it should be read as its
//! additive inverse, and whether consuming it should copy (`pick`) or
//! move (`roll`) it. Positions of `-k` address the `k`-th element from
//! the stack bottom, where injected constants live.

use crate::builder::ops::{pick, roll};
use crate::error::BuilderError;
use crate::script::Script;

/// Whether moving an element to the stack top copies or consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveMode {
    /// Duplicate; the original stays in place.
    Pick,
    /// Move; the original is removed.
    Roll,
}

impl MoveMode {
    pub fn is_roll(self) -> bool {
        matches!(self, MoveMode::Roll)
    }
}

/// An untyped stack element: a single slot at `position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackBaseElement {
    pub position: i64,
}

impl StackBaseElement {
    pub fn new(position: i64) -> Self {
        Self { position }
    }

    /// A copy of `self` shifted `n` slots deeper (negative `n` moves it
    /// toward the top).
    pub fn shift(self, n: i64) -> Self {
        Self {
            position: self.position + n,
        }
    }

    /// Emits the move of this element to the top of the stack.
    pub fn move_with(self, mode: MoveMode) -> Script {
        match mode {
            MoveMode::Pick => pick(self.position, 1),
            MoveMode::Roll => roll(self.position, 1),
        }
    }
}

/// A signed-integer stack element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackNumber {
    pub position: i64,
    /// Consume the element as its additive inverse.
    pub negate: bool,
    pub mode: MoveMode,
}

impl StackNumber {
    pub fn new(position: i64, negate: bool, mode: MoveMode) -> Self {
        Self {
            position,
            negate,
            mode,
        }
    }

    pub fn shift(self, n: i64) -> Self {
        Self {
            position: self.position + n,
            ..self
        }
    }

    pub fn move_to_top(self) -> Script {
        match self.mode {
            MoveMode::Pick => pick(self.position, 1),
            MoveMode::Roll => roll(self.position, 1),
        }
    }
}

/// A finite-field element of extension degree `d >= 1`, occupying the
/// `d` consecutive slots `position .. position - d + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackFiniteFieldElement {
    pub position: i64,
    pub negate: bool,
    pub extension_degree: usize,
    pub mode: MoveMode,
}

impl StackFiniteFieldElement {
    pub fn new(
        position: i64,
        negate: bool,
        extension_degree: usize,
        mode: MoveMode,
    ) -> Result<Self, BuilderError> {
        if extension_degree == 0 {
            return Err(BuilderError::ZeroExtensionDegree);
        }
        if position >= 0 && position - extension_degree as i64 + 1 < 0 {
            return Err(BuilderError::ElementOffStack {
                position,
                extension_degree,
            });
        }
        Ok(Self {
            position,
            negate,
            extension_degree,
            mode,
        })
    }

    /// Prime-field element (degree 1), rolled.
    pub fn rolled(position: i64) -> Self {
        Self {
            position,
            negate: false,
            extension_degree: 1,
            mode: MoveMode::Roll,
        }
    }

    /// Prime-field element (degree 1), picked.
    pub fn picked(position: i64) -> Self {
        Self {
            position,
            negate: false,
            extension_degree: 1,
            mode: MoveMode::Pick,
        }
    }

    pub fn with_negate(mut self, negate: bool) -> Self {
        self.negate = negate;
        self
    }

    pub fn shift(self, n: i64) -> Result<Self, BuilderError> {
        let position = self.position + n;
        if position >= 0 && position - self.extension_degree as i64 + 1 < 0 {
            return Err(BuilderError::ShiftOutOfRange {
                position: self.position,
                shift: n,
            });
        }
        Ok(Self { position, ..self })
    }

    /// Whether all of `self` sits strictly deeper than `other`.
    pub fn is_before(&self, other: &StackFiniteFieldElement) -> bool {
        self.position - self.extension_degree as i64 >= other.position
    }

    /// Whether the tail of `self` overlaps the head of `other`.
    pub fn overlaps_on_the_right(
        &self,
        other: &StackFiniteFieldElement,
    ) -> Result<(), BuilderError> {
        if self.position - (self.extension_degree as i64) < other.position {
            return Err(BuilderError::OverlappingElements {
                first_position: self.position,
                first_extension_degree: self.extension_degree,
                second_position: other.position,
            });
        }
        Ok(())
    }

    /// Emits the move of this element's slots to the top, preserving
    /// their order.
    pub fn move_to_top(self) -> Script {
        match self.mode {
            MoveMode::Pick => pick(self.position, self.extension_degree),
            MoveMode::Roll => roll(self.position, self.extension_degree),
        }
    }
}

/// An affine elliptic-curve point: `x` strictly above-of... deeper than
/// `y` on the stack, both of the same extension degree. The point's
/// overall sign is `y.negate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackEllipticCurvePoint {
    pub x: StackFiniteFieldElement,
    pub y: StackFiniteFieldElement,
}

impl StackEllipticCurvePoint {
    pub fn new(
        x: StackFiniteFieldElement,
        y: StackFiniteFieldElement,
    ) -> Result<Self, BuilderError> {
        x.overlaps_on_the_right(&y)?;
        if x.extension_degree != y.extension_degree {
            return Err(BuilderError::MismatchedCoordinateDegrees {
                x_degree: x.extension_degree,
                y_degree: y.extension_degree,
            });
        }
        Ok(Self { x, y })
    }

    /// A degree-1 point at `(position, position - 1)`, rolled.
    pub fn rolled(position: i64) -> Self {
        Self {
            x: StackFiniteFieldElement::rolled(position),
            y: StackFiniteFieldElement::rolled(position - 1),
        }
    }

    /// A degree-1 point at `(position, position - 1)`, picked.
    pub fn picked(position: i64) -> Self {
        Self {
            x: StackFiniteFieldElement::picked(position),
            y: StackFiniteFieldElement::picked(position - 1),
        }
    }

    pub fn position(&self) -> i64 {
        self.x.position
    }

    pub fn negate(&self) -> bool {
        self.y.negate
    }

    pub fn mode(&self) -> MoveMode {
        self.x.mode
    }

    pub fn extension_degree(&self) -> usize {
        self.x.extension_degree
    }

    pub fn set_negate(mut self, negate: bool) -> Self {
        self.y.negate = negate;
        self
    }

    pub fn shift(self, n: i64) -> Result<Self, BuilderError> {
        Ok(Self {
            x: self.x.shift(n)?,
            y: self.y.shift(n)?,
        })
    }

    /// Whether the whole point sits strictly deeper than `other`.
    pub fn is_before(&self, other: &StackEllipticCurvePoint) -> bool {
        self.y.is_before(&other.x)
    }
}

/// Emits the moves bringing `elements` to the top of the stack in the
/// given order (first element ends up deepest of the group), accounting
/// for the position shifts each move causes on the ones still pending.
///
/// Elements must be listed deepest first and must not overlap; rolled
/// elements vanish from their old position, picked ones stay.
pub(crate) fn gather(elements: &[(i64, usize, MoveMode)]) -> Script {
    let mut out = Script::new();
    let mut pending: Vec<(i64, usize, MoveMode)> = elements.to_vec();

    for i in 0..pending.len() {
        let (position, width, mode) = pending[i];
        out.append(match mode {
            MoveMode::Pick => pick(position, width),
            MoveMode::Roll => roll(position, width),
        });
        let w = width as i64;
        for (other_pos, _, _) in pending.iter_mut().skip(i + 1) {
            let top_slot = position - width as i64 + 1;
            // Positions name the deepest slot; the element lies entirely
            // above the moved block iff that slot is above it.
            let other_is_above = *other_pos < top_slot;
            match mode {
                // Picking grows the stack for everyone.
                MoveMode::Pick => *other_pos += w,
                // Rolling only sinks the elements above the rolled block.
                MoveMode::Roll => {
                    if other_is_above {
                        *other_pos += w;
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ExecuteOpts;
    use crate::script::{run_unlock_then_lock, Script};

    fn ints(ns: &[i64]) -> Script {
        let mut s = Script::new();
        for &n in ns {
            s.push_i64(n);
        }
        s
    }

    fn run(setup: &Script, body: &Script) -> Vec<Vec<u8>> {
        run_unlock_then_lock(setup, body, &ExecuteOpts::default()).unwrap()
    }

    #[test]
    fn field_element_must_fit() {
        let err = StackFiniteFieldElement::new(1, false, 3, MoveMode::Roll).unwrap_err();
        assert!(matches!(err, BuilderError::ElementOffStack { .. }));
        assert!(StackFiniteFieldElement::new(2, false, 3, MoveMode::Roll).is_ok());
    }

    #[test]
    fn zero_degree_rejected() {
        let err = StackFiniteFieldElement::new(0, false, 0, MoveMode::Roll).unwrap_err();
        assert!(matches!(err, BuilderError::ZeroExtensionDegree));
    }

    #[test]
    fn point_coordinates_must_not_overlap() {
        let x = StackFiniteFieldElement::new(3, false, 2, MoveMode::Roll).unwrap();
        let y = StackFiniteFieldElement::new(2, false, 2, MoveMode::Roll).unwrap();
        let err = StackEllipticCurvePoint::new(x, y).unwrap_err();
        assert!(matches!(err, BuilderError::OverlappingElements { .. }));
    }

    #[test]
    fn point_coordinate_degrees_must_match() {
        let x = StackFiniteFieldElement::new(3, false, 2, MoveMode::Roll).unwrap();
        let y = StackFiniteFieldElement::new(0, false, 1, MoveMode::Roll).unwrap();
        let err = StackEllipticCurvePoint::new(x, y).unwrap_err();
        assert!(matches!(err, BuilderError::MismatchedCoordinateDegrees { .. }));
    }

    #[test]
    fn point_sign_is_y_sign() {
        let p = StackEllipticCurvePoint::rolled(1).set_negate(true);
        assert!(p.negate());
        assert!(!p.x.negate);
    }

    #[test]
    fn shift_checks_range() {
        let e = StackFiniteFieldElement::new(3, false, 2, MoveMode::Roll).unwrap();
        assert_eq!(e.shift(2).unwrap().position, 5);
        assert!(matches!(
            e.shift(-3),
            Err(BuilderError::ShiftOutOfRange { .. })
        ));
    }

    #[test]
    fn gather_rolls_in_order() {
        // Stack [1 2 3 4 5]; gather element at 4 (roll) then 1..0 (roll):
        // expect [2 3 1 4 5].
        let body = gather(&[
            (4, 1, MoveMode::Roll),
            (1, 2, MoveMode::Roll),
        ]);
        let stack = run(&ints(&[1, 2, 3, 4, 5]), &body);
        assert_eq!(
            stack,
            vec![vec![2], vec![3], vec![1], vec![4], vec![5]]
        );
    }

    #[test]
    fn gather_mixed_pick_and_roll() {
        // Stack [9 7 8]; roll 9 (position 2), pick pair (1,0):
        // rolled 9 goes on top, then copies of 7 8.
        let body = gather(&[(2, 1, MoveMode::Roll), (1, 2, MoveMode::Pick)]);
        let stack = run(&ints(&[9, 7, 8]), &body);
        assert_eq!(
            stack,
            vec![vec![7], vec![8], vec![9], vec![7], vec![8]]
        );
    }

    #[test]
    fn gather_accounts_for_earlier_picks() {
        // Stack [5 6]; pick 5 (position 1) then roll 6 (position 0 before
        // the pick, 1 after).
        let body = gather(&[(1, 1, MoveMode::Pick), (0, 1, MoveMode::Roll)]);
        let stack = run(&ints(&[5, 6]), &body);
        assert_eq!(stack, vec![vec![5], vec![5], vec![6]]);
    }
}
