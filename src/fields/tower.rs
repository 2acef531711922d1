//! Shared emission engine for the tower extensions.
//!
//! Every extension in the tower embeds into `F_q^2[t] / (t^6 - xi)`
//! with `xi = 1 + u`: the quartic field is spanned by `{1, t^3}`, the
//! sextic by `{1, t^2, t^4}`, and the two degree-12 representations are
//! the same algebra with different slot orders. A compile-time
//! [`SlotLayout`] records which `t`-degrees an element's stack slots
//! hold (and whether a slot carries only the real half of its `F_q^2`
//! coefficient); one generic multiplier then serves dense tower
//! products and the sparse line-evaluation products of the Miller loop
//! alike.

use crate::builder::ops::{pick, roll};
use crate::fields::fq2::Fq2;
use crate::builder::OpFlags;
use crate::opcode::Opcode;
use crate::script::Script;

/// One stack slot group of a tower element: the `F_q^2` coefficient of
/// `t^degree`. A `full` slot occupies two stack items `[re, im]`; a
/// half slot carries only the real item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub degree: usize,
    pub full: bool,
}

impl Slot {
    pub const fn full(degree: usize) -> Self {
        Self { degree, full: true }
    }

    pub const fn real(degree: usize) -> Self {
        Self {
            degree,
            full: false,
        }
    }

    pub fn items(&self) -> usize {
        if self.full {
            2
        } else {
            1
        }
    }
}

/// The ordered slot list of a tower element, deepest slot first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotLayout {
    slots: Vec<Slot>,
}

impl SlotLayout {
    pub fn new(slots: Vec<Slot>) -> Self {
        assert!(!slots.is_empty(), "a tower element has at least one slot");
        Self { slots }
    }

    /// Quadratic-over-cubic `F_q^12`: `(y00, y01, y02, y10, y11, y12)`.
    pub fn fq12_quadratic() -> Self {
        Self::new([0, 2, 4, 1, 3, 5].map(Slot::full).to_vec())
    }

    /// Cubic-over-quadratic `F_q^12`: `((a, b), (c, d), (e, f))` over
    /// the quartic field.
    pub fn fq12_cubic() -> Self {
        Self::new([0, 3, 1, 4, 2, 5].map(Slot::full).to_vec())
    }

    /// Sextic extension as cubic over `F_q^2` (`v = t^2`).
    pub fn fq6() -> Self {
        Self::new([0, 2, 4].map(Slot::full).to_vec())
    }

    /// Quartic extension as quadratic over `F_q^2` (`r = t^3`).
    pub fn fq4() -> Self {
        Self::new([0, 3].map(Slot::full).to_vec())
    }

    /// A line evaluation: `c0 + c3 t^3 + c2 t^2` with `c3` real-only.
    pub fn line_evaluation() -> Self {
        Self::new(vec![Slot::full(0), Slot::real(3), Slot::full(2)])
    }

    /// Product of two line evaluations: degrees `{0, 3, 4, 2, 5}` in
    /// cubic slot order (`t^1` is structurally zero).
    pub fn eval_times_eval() -> Self {
        Self::new([0, 3, 4, 2, 5].map(Slot::full).to_vec())
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Total stack items the layout occupies.
    pub fn items(&self) -> usize {
        self.slots.iter().map(Slot::items).sum()
    }

    /// Stack position (distance from top) of a slot's deepest item,
    /// given `extra` items currently stacked above the element.
    fn slot_position(&self, index: usize, extra: usize) -> i64 {
        let before: usize = self.slots[..index].iter().map(Slot::items).sum();
        (self.items() - 1 - before) as i64 + extra as i64
    }
}

/// Emits `OP_TOALTSTACK` `n` times.
pub fn to_altstack(n: usize) -> Script {
    let mut out = Script::new();
    for _ in 0..n {
        out.op(Opcode::OpToAltStack);
    }
    out
}

/// Emits `OP_FROMALTSTACK` `n` times.
pub fn from_altstack(n: usize) -> Script {
    let mut out = Script::new();
    for _ in 0..n {
        out.op(Opcode::OpFromAltStack);
    }
    out
}

/// Emits the drop of the top `n` stack items.
pub fn drop_items(n: usize) -> Script {
    let mut out = Script::new();
    for _ in 0..n / 2 {
        out.op(Opcode::Op2Drop);
    }
    if n % 2 == 1 {
        out.op(Opcode::OpDrop);
    }
    out
}

/// Component-wise addition of two `n`-slot elements:
/// `[.., X, Y] -> [.., X + Y]`.
pub fn add_slots(n: usize) -> Script {
    let mut out = Script::new();
    for i in 0..n - 1 {
        out.append(roll((n - i) as i64, 1));
        out.op(Opcode::OpAdd);
        out.op(Opcode::OpToAltStack);
    }
    out.op(Opcode::OpAdd);
    out.append(from_altstack(n - 1));
    out
}

/// Component-wise subtraction: `[.., X, Y] -> [.., X - Y]`.
pub fn sub_slots(n: usize) -> Script {
    let mut out = Script::new();
    for i in 0..n - 1 {
        out.append(roll((n - i) as i64, 1));
        out.op(Opcode::OpSwap);
        out.op(Opcode::OpSub);
        out.op(Opcode::OpToAltStack);
    }
    out.op(Opcode::OpSub);
    out.append(from_altstack(n - 1));
    out
}

/// Component-wise negation of the top `n` slots.
pub fn negate_slots(n: usize) -> Script {
    let mut out = Script::new();
    for _ in 0..n {
        out.op(Opcode::OpNegate);
        out.op(Opcode::OpToAltStack);
    }
    out.append(from_altstack(n));
    out
}

/// Emits the product of two tower elements.
///
/// Stack in: `[.., X, Y]` with `X` laid out per `x_layout` and `Y` on
/// top of it per `y_layout`. Stack out: `[.., X * Y]` in `out_layout`
/// order, both inputs consumed. Every output slot is emitted full
/// (two items), one `F_q^2` accumulation at a time; coefficient pairs
/// whose degrees wrap past `t^6` pick up a `xi = 1 + u` factor.
///
/// The caller is responsible for the bit-size budget; no reduction is
/// emitted here.
pub fn mul_layout(
    fq2: &Fq2,
    x_layout: &SlotLayout,
    y_layout: &SlotLayout,
    out_layout: &SlotLayout,
) -> Script {
    let nx = x_layout.items();
    let ny = y_layout.items();
    let total = nx + ny;
    let bare = OpFlags::bare();

    let mut out = Script::new();

    // Position helper over the combined input region: `Y` sits on top of
    // `X`, so X slot positions are deepened by the Y items.
    let x_pos = |i: usize, extra: usize| x_layout.slot_position(i, ny + extra);
    let y_pos = |j: usize, extra: usize| y_layout.slot_position(j, extra);

    // Compute output slots in reverse layout order so the altstack
    // restores them in layout order.
    for slot in out_layout.slots().iter().rev() {
        let mut pairs: Vec<(usize, usize, bool)> = Vec::new();
        for (i, xs) in x_layout.slots().iter().enumerate() {
            for (j, ys) in y_layout.slots().iter().enumerate() {
                let degree = xs.degree + ys.degree;
                if degree % 6 == slot.degree {
                    pairs.push((i, j, degree >= 6));
                }
            }
        }
        assert!(
            !pairs.is_empty(),
            "output layout names t^{} but no input degrees produce it",
            slot.degree
        );

        let mut extra = 0usize;
        for (k, &(i, j, wraps)) in pairs.iter().enumerate() {
            let xs = x_layout.slots()[i];
            let ys = y_layout.slots()[j];

            match (xs.full, ys.full) {
                (true, true) => {
                    out.append(pick(x_pos(i, extra), 2));
                    out.append(pick(y_pos(j, extra + 2), 2));
                    out.append(fq2.mul(bare));
                }
                (true, false) => {
                    out.append(pick(x_pos(i, extra), 2));
                    out.append(pick(y_pos(j, extra + 2), 1));
                    out.append(fq2.scalar_mul(bare));
                }
                (false, true) => {
                    out.append(pick(y_pos(j, extra), 2));
                    out.append(pick(x_pos(i, extra + 2), 1));
                    out.append(fq2.scalar_mul(bare));
                }
                (false, false) => {
                    out.append(pick(x_pos(i, extra), 1));
                    out.append(pick(y_pos(j, extra + 1), 1));
                    out.op(Opcode::OpMul);
                    out.op(Opcode::Op0);
                }
            }
            if wraps {
                out.append(fq2.mul_by_one_plus_u(bare));
            }
            if k > 0 {
                out.append(fq2.add(bare));
            }
            extra = 2;
        }
        out.append(to_altstack(2));
    }

    out.append(drop_items(total));
    out.append(from_altstack(2 * out_layout.slots().len()));
    out
}
