//! `set`/`unset`/`is_set`: copy-on-write cell mutation, universe expansion
//! and containment, and contraction back to the empty universe.
//!
//! Grounded in `original_source/hgolbi.c`'s `universe_cell_accessor` (the
//! single function backing `cell_set`/`cell_unset`/`cell_is_set` in the C
//! original) and `universe_expand`, adapted into the copy-on-write /
//! re-canonicalize-bottom-up shape `SPEC_FULL.md` §4.4 / `spec.md` §4.4
//! describe. Coordinate comparisons are done in the unsigned domain (via
//! [`crate::bigint::signed_to_unsigned`]) so that a universe can legally
//! grow to cover the entire 256-bit range without signed overflow.

use crate::bigint::{self, IBig};
use crate::hashcons::HashCons;
use crate::node::{CellHandle, Quadrant};

/// Whether `(x, y)` lies in the closed-open box
/// `[x0, x0+2^height) x [y0, y0+2^height)`. `height >= 256` is treated as
/// covering the whole representable space (the box at that height would
/// literally be `2^256` cells wide, which cannot itself be represented by
/// a [`UBig`] side length without wrapping to zero).
fn in_box(height: u16, x0: IBig, y0: IBig, x: IBig, y: IBig) -> bool {
    if height >= 256 {
        return true;
    }
    let side = bigint::side_len(height);
    let (ux0, uy0) = (bigint::signed_to_unsigned(x0), bigint::signed_to_unsigned(y0));
    let (ux, uy) = (bigint::signed_to_unsigned(x), bigint::signed_to_unsigned(y));
    ux >= ux0 && ux - ux0 < side && uy >= uy0 && uy - uy0 < side
}

/// The even integer immediately at or below `v`; used to find the
/// north-west corner of the smallest 2x2 box containing a single point.
fn floor_even(v: IBig) -> IBig {
    if v & IBig::ONE == IBig::ONE {
        v - IBig::ONE
    } else {
        v
    }
}

/// Grows the universe, re-embedding the current root centred in a new
/// root one level taller, until `(x, y)` is contained in the box (or the
/// maximum height of 256 is reached).
pub fn expand_to_contain(
    hc: &mut HashCons,
    root: &mut CellHandle,
    height: &mut u16,
    x0: &mut IBig,
    y0: &mut IBig,
    x: IBig,
    y: IBig,
) {
    while *height < 256 && !in_box(*height, *x0, *y0, x, y) {
        expand_once(hc, root, height, x0, y0);
    }
}

pub(crate) fn expand_once(hc: &mut HashCons, root: &mut CellHandle, height: &mut u16, x0: &mut IBig, y0: &mut IBig) {
    let old_height = *height;
    let old_root = root.take();

    let mut new_children: [CellHandle; 4] = Default::default();
    for q in Quadrant::ALL {
        let old_child = match &old_root {
            None => None,
            Some(node) => node.child(q).clone(),
        };
        hc.retain(&old_child);
        let mut sub: [CellHandle; 4] = Default::default();
        sub[q.opposite().index()] = old_child;
        new_children[q.index()] = hc.canonicalize(old_height, sub);
    }
    for child in &new_children {
        hc.retain(child);
    }
    let new_root = hc.canonicalize(old_height + 1, new_children);
    hc.retain(&new_root);
    hc.release(&old_root);

    let half = IBig::ONE << (old_height - 1) as u32;
    *x0 -= half;
    *y0 -= half;
    *root = new_root;
    *height = old_height + 1;
}

/// Sets the cell at `(x, y)`, expanding the universe if needed.
pub fn cell_set(hc: &mut HashCons, root: &mut CellHandle, height: &mut u16, x0: &mut IBig, y0: &mut IBig, x: IBig, y: IBig) {
    if root.is_none() {
        seed_empty_universe(hc, root, height, x0, y0, x, y);
        return;
    }
    expand_to_contain(hc, root, height, x0, y0, x, y);
    descend_and_mutate(hc, root, *height, *x0, *y0, x, y, true);
}

/// Unsets the cell at `(x, y)`. A no-op if the universe is already empty
/// or the position is outside the current box (which, since outside
/// implies absent, means it is already unset).
pub fn cell_unset(hc: &mut HashCons, root: &mut CellHandle, height: &mut u16, x0: &mut IBig, y0: &mut IBig, x: IBig, y: IBig) {
    if root.is_none() || !in_box(*height, *x0, *y0, x, y) {
        return;
    }
    descend_and_mutate(hc, root, *height, *x0, *y0, x, y, false);
    if root.is_none() {
        *height = 0;
        *x0 = IBig::ZERO;
        *y0 = IBig::ZERO;
    }
}

/// Reports whether the cell at `(x, y)` is alive.
pub fn cell_is_set(root: &CellHandle, height: u16, x0: IBig, y0: IBig, x: IBig, y: IBig) -> bool {
    if root.is_none() || !in_box(height, x0, y0, x, y) {
        return false;
    }
    let (mut bx, mut by) = (bigint::signed_to_unsigned(x0), bigint::signed_to_unsigned(y0));
    let (ux, uy) = (bigint::signed_to_unsigned(x), bigint::signed_to_unsigned(y));
    let mut node = root.clone();
    for h in (1..=height).rev() {
        let half = bigint::side_len(h - 1);
        let east = ux >= bx + half;
        let south = uy >= by + half;
        let q = Quadrant::of(east, south);
        node = match &node {
            None => return false,
            Some(n) => n.child(q).clone(),
        };
        if east {
            bx += half;
        }
        if south {
            by += half;
        }
    }
    node.is_some()
}

fn seed_empty_universe(
    hc: &mut HashCons,
    root: &mut CellHandle,
    height: &mut u16,
    x0: &mut IBig,
    y0: &mut IBig,
    x: IBig,
    y: IBig,
) {
    let bx0 = floor_even(x);
    let by0 = floor_even(y);
    let q = Quadrant::of(x != bx0, y != by0);
    let mut children: [CellHandle; 4] = Default::default();
    children[q.index()] = hc.on_leaf();
    hc.retain(&children[q.index()]);
    let new_root = hc.canonicalize(1, children);
    hc.retain(&new_root);
    *root = new_root;
    *height = 1;
    *x0 = bx0;
    *y0 = by0;
}

/// The copy-on-write descent and bottom-up re-canonicalization shared by
/// `cell_set`/`cell_unset`: records the quadrant path from `root` down to
/// the target leaf, replaces the leaf, then rebuilds each ancestor with
/// one child slot replaced, canonicalizing and adjusting refcounts at
/// every level.
fn descend_and_mutate(
    hc: &mut HashCons,
    root: &mut CellHandle,
    height: u16,
    x0: IBig,
    y0: IBig,
    x: IBig,
    y: IBig,
    set: bool,
) {
    let old_root = root.clone();
    let (mut bx, mut by) = (bigint::signed_to_unsigned(x0), bigint::signed_to_unsigned(y0));
    let (ux, uy) = (bigint::signed_to_unsigned(x), bigint::signed_to_unsigned(y));

    let mut path: Vec<(CellHandle, Quadrant, u16)> = Vec::with_capacity(height as usize);
    let mut node = old_root.clone();
    for h in (1..=height).rev() {
        let half = bigint::side_len(h - 1);
        let east = ux >= bx + half;
        let south = uy >= by + half;
        let q = Quadrant::of(east, south);
        path.push((node.clone(), q, h));
        node = match &node {
            None => None,
            Some(n) => n.child(q).clone(),
        };
        if east {
            bx += half;
        }
        if south {
            by += half;
        }
    }

    let mut new_child: CellHandle = if set { hc.on_leaf() } else { None };

    // `path` was recorded root-to-leaf (height downto 1); rebuilding must
    // go leaf-to-root (height 1 upto `height`), i.e. in reverse.
    for (old_node, q, h) in path.into_iter().rev() {
        let mut new_children: [CellHandle; 4] = match &old_node {
            None => Default::default(),
            Some(n) => n.children().clone(),
        };
        for (i, child) in new_children.iter().enumerate() {
            if i != q.index() {
                hc.retain(child);
            }
        }
        new_children[q.index()] = new_child;
        // Every slot in `new_children` is now referenced by the parent
        // about to be canonicalized, including this one: retain it here
        // rather than relying on a retain from an earlier iteration, since
        // this is the first point at which *this* parent-slot reference
        // to it exists.
        hc.retain(&new_children[q.index()]);
        new_child = hc.canonicalize(h, new_children);
    }

    hc.retain(&new_child);
    hc.release(&old_root);
    *root = new_child;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_is_set_round_trips() {
        let mut hc = HashCons::new();
        let mut root: CellHandle = None;
        let mut height = 0u16;
        let mut x0 = IBig::ZERO;
        let mut y0 = IBig::ZERO;

        cell_set(&mut hc, &mut root, &mut height, &mut x0, &mut y0, IBig::from(3i64), IBig::from(-2i64));
        assert!(cell_is_set(&root, height, x0, y0, IBig::from(3i64), IBig::from(-2i64)));
        assert!(!cell_is_set(&root, height, x0, y0, IBig::from(0i64), IBig::from(0i64)));
    }

    #[test]
    fn unset_clears_and_contracts_when_last_cell_removed() {
        let mut hc = HashCons::new();
        let mut root: CellHandle = None;
        let mut height = 0u16;
        let mut x0 = IBig::ZERO;
        let mut y0 = IBig::ZERO;

        cell_set(&mut hc, &mut root, &mut height, &mut x0, &mut y0, IBig::ZERO, IBig::ZERO);
        cell_unset(&mut hc, &mut root, &mut height, &mut x0, &mut y0, IBig::ZERO, IBig::ZERO);
        assert!(root.is_none());
        assert_eq!(height, 0);
        assert!(!cell_is_set(&root, height, x0, y0, IBig::ZERO, IBig::ZERO));
    }

    #[test]
    fn expansion_preserves_previously_set_cells() {
        let mut hc = HashCons::new();
        let mut root: CellHandle = None;
        let mut height = 0u16;
        let mut x0 = IBig::ZERO;
        let mut y0 = IBig::ZERO;

        cell_set(&mut hc, &mut root, &mut height, &mut x0, &mut y0, IBig::ZERO, IBig::ZERO);
        // Force growth far outside the initial 2x2 box.
        cell_set(&mut hc, &mut root, &mut height, &mut x0, &mut y0, IBig::from(1_000_000i64), IBig::from(-1_000_000i64));

        assert!(cell_is_set(&root, height, x0, y0, IBig::ZERO, IBig::ZERO));
        assert!(cell_is_set(&root, height, x0, y0, IBig::from(1_000_000i64), IBig::from(-1_000_000i64)));
        assert!(!cell_is_set(&root, height, x0, y0, IBig::from(42i64), IBig::from(42i64)));
    }

    #[test]
    fn block_pattern_is_four_live_cells() {
        let mut hc = HashCons::new();
        let mut root: CellHandle = None;
        let mut height = 0u16;
        let mut x0 = IBig::ZERO;
        let mut y0 = IBig::ZERO;

        for (x, y) in [(0i64, 0i64), (1, 0), (0, 1), (1, 1)] {
            cell_set(&mut hc, &mut root, &mut height, &mut x0, &mut y0, IBig::from(x), IBig::from(y));
        }
        for (x, y) in [(0i64, 0i64), (1, 0), (0, 1), (1, 1)] {
            assert!(cell_is_set(&root, height, x0, y0, IBig::from(x), IBig::from(y)));
        }
        assert!(!cell_is_set(&root, height, x0, y0, IBig::from(2i64), IBig::from(2i64)));
    }
}
