//! `result(m, height)`: the recursive RESULT computation at the heart of
//! HashLife.
//!
//! Grounded directly in `original_source/hgolbi.c`'s `universe_get_RESULT`:
//! the base case folds a height-2 macrocell's sixteen leaves through the
//! 4x4 rule table, and the recursive case builds the same thirty-six
//! intermediate height-`(h-3)` cells (nine overlapping "RESULT of quadrant"
//! computations regrouped into four overlapping height-`(h-1)` squares)
//! before a final `result()` of each of those four squares assembles the
//! answer. Neither `rlifesrc-lib` nor the other retrieval-pack crates
//! implement this recursion; the 4x4-table brute force is, however, the
//! same "precompute every field, brute-force each entry" idiom
//! `rules::life::Life::new` uses for its own implication table.

use std::rc::Rc;

use crate::hashcons::HashCons;
use crate::node::{CellHandle, Macrocell, Quadrant};
use crate::rule::{fold_4x4, Rule};

/// Computes (and memoizes in `m`) the concentric `2^(height-2)`-generations-
/// ahead successor of `m`, a canonical macrocell at the given `height`
/// (`height >= 2`).
pub fn result(hc: &mut HashCons, rule: &Rule, m: &CellHandle, height: u16) -> CellHandle {
    debug_assert!(height >= 2);
    let node = match m {
        None => return None,
        Some(node) => node,
    };
    debug_assert_eq!(node.height, height);

    if let Some(cached) = node.cached_result() {
        return cached;
    }

    let computed = if height == 2 {
        base_case(hc, rule, node)
    } else {
        recursive_case(hc, rule, m, height)
    };
    node.set_cached_result(computed.clone());
    computed
}

fn child_of(handle: &CellHandle, q: Quadrant) -> CellHandle {
    match handle {
        None => None,
        Some(node) => node.child(q).clone(),
    }
}

/// Folds a height-2 macrocell's sixteen leaves and looks up the central
/// 2x2 successor in the rule table.
fn base_case(hc: &mut HashCons, rule: &Rule, node: &Rc<Macrocell>) -> CellHandle {
    let field = fold_4x4(|outer, inner| {
        node.child(outer).as_ref().map_or(false, |mid| mid.child(inner).is_some())
    });
    let bits = rule.lookup(field);

    let mut children: [CellHandle; 4] = Default::default();
    for q in Quadrant::ALL {
        if (bits >> q.index()) & 1 != 0 {
            children[q.index()] = hc.on_leaf();
        }
    }
    hc.canonicalize(1, children)
}

/// Writes `value`'s own four sub-quadrants into a 6x6 grid of
/// height-`(h-3)` cells, at the 2x2 block whose top-left corner is
/// `(row0, col0)`.
fn place_2x2(grid: &mut [[CellHandle; 6]; 6], row0: usize, col0: usize, value: &CellHandle) {
    let get = |q: Quadrant| child_of(value, q);
    grid[row0][col0] = get(Quadrant::Nw);
    grid[row0][col0 + 1] = get(Quadrant::Ne);
    grid[row0 + 1][col0] = get(Quadrant::Sw);
    grid[row0 + 1][col0 + 1] = get(Quadrant::Se);
}

fn block_at(grid: &[[CellHandle; 6]; 6], row: usize, col: usize) -> [CellHandle; 4] {
    [
        grid[row][col].clone(),
        grid[row][col + 1].clone(),
        grid[row + 1][col].clone(),
        grid[row + 1][col + 1].clone(),
    ]
}

/// Builds the thirty-six height-`(h-3)` cell grid shared by
/// [`recursive_case`] and, via [`regroup_quadrant`], by the Explorer's SHOW
/// recursion (`crate::explorer`): four corner `result`s of `m`'s own
/// quadrants, plus five artificially-shifted "inter-quadrant" `result`s
/// excavating the dikes the corners leave uncovered.
pub(crate) fn build_grid(hc: &mut HashCons, rule: &Rule, m: &CellHandle, height: u16) -> [[CellHandle; 6]; 6] {
    let quadrants: [CellHandle; 4] = [
        child_of(m, Quadrant::Nw),
        child_of(m, Quadrant::Ne),
        child_of(m, Quadrant::Sw),
        child_of(m, Quadrant::Se),
    ];
    let nw = &quadrants[Quadrant::Nw.index()];
    let ne = &quadrants[Quadrant::Ne.index()];
    let sw = &quadrants[Quadrant::Sw.index()];
    let se = &quadrants[Quadrant::Se.index()];

    let mut grid: [[CellHandle; 6]; 6] = Default::default();

    // Regions 1-4: the RESULTs of m's own four quadrants, at the corners.
    for q in Quadrant::ALL {
        let r = result(hc, rule, &quadrants[q.index()], height - 1);
        let row0 = if q.is_south() { 4 } else { 0 };
        let col0 = if q.is_east() { 4 } else { 0 };
        place_2x2(&mut grid, row0, col0, &r);
    }

    // Regions 5-9: five artificial macrocells built from the inner
    // corners of adjacent quadrants, excavating the "dikes" the four
    // corner RESULTs leave uncovered.
    let artificial: [(usize, usize, [CellHandle; 4]); 5] = [
        (
            0,
            2,
            [child_of(nw, Quadrant::Ne), child_of(ne, Quadrant::Nw), child_of(nw, Quadrant::Se), child_of(ne, Quadrant::Sw)],
        ),
        (
            4,
            2,
            [child_of(sw, Quadrant::Ne), child_of(se, Quadrant::Nw), child_of(sw, Quadrant::Se), child_of(se, Quadrant::Sw)],
        ),
        (
            2,
            0,
            [child_of(nw, Quadrant::Sw), child_of(nw, Quadrant::Se), child_of(sw, Quadrant::Nw), child_of(sw, Quadrant::Ne)],
        ),
        (
            2,
            4,
            [child_of(ne, Quadrant::Sw), child_of(ne, Quadrant::Se), child_of(se, Quadrant::Nw), child_of(se, Quadrant::Ne)],
        ),
        (
            2,
            2,
            [child_of(nw, Quadrant::Se), child_of(ne, Quadrant::Sw), child_of(sw, Quadrant::Ne), child_of(se, Quadrant::Nw)],
        ),
    ];
    for (row0, col0, children) in artificial {
        let shifted = hc.canonicalize(height - 1, children);
        let r = result(hc, rule, &shifted, height - 1);
        place_2x2(&mut grid, row0, col0, &r);
    }

    grid
}

/// Regroups the `u`-th overlapping height-`(h-1)` concentric square out of
/// the thirty-six-cell grid built at some height `h`, *without* taking its
/// own `result`: the Explorer needs the pre-result node itself to recurse
/// SHOW into, while [`recursive_case`] immediately takes `result` of what
/// this returns. `height` is the height `build_grid` was called with, so
/// the square's children are canonicalized at `height - 2` and the square
/// itself at `height - 1`.
pub(crate) fn regroup_quadrant(hc: &mut HashCons, grid: &[[CellHandle; 6]; 6], height: u16, u: Quadrant) -> CellHandle {
    let bigrow = if u.is_south() { 2 } else { 0 };
    let bigcol = if u.is_east() { 2 } else { 0 };

    let mut qtemps: [CellHandle; 4] = Default::default();
    for j in Quadrant::ALL {
        let (dr, dc) = match j {
            Quadrant::Nw => (0, 0),
            Quadrant::Ne => (0, 2),
            Quadrant::Sw => (2, 0),
            Quadrant::Se => (2, 2),
        };
        let block = block_at(grid, bigrow + dr, bigcol + dc);
        qtemps[j.index()] = hc.canonicalize(height - 2, block);
    }
    hc.canonicalize(height - 1, qtemps)
}

/// The thirteen-region decomposition for a macrocell at height `h > 2`:
/// builds the shared 6x6 grid, regroups it into four overlapping
/// height-`(h-1)` squares, and takes each square's `result` to assemble the
/// final height-`(h-1)` answer.
fn recursive_case(hc: &mut HashCons, rule: &Rule, m: &CellHandle, height: u16) -> CellHandle {
    let grid = build_grid(hc, rule, m, height);

    let mut final_children: [CellHandle; 4] = Default::default();
    for u in Quadrant::ALL {
        let mtemp = regroup_quadrant(hc, &grid, height, u);
        final_children[u.index()] = result(hc, rule, &mtemp, height - 1);
    }

    hc.canonicalize(height - 1, final_children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Quadrant;

    /// Builds a height-2 macrocell from a `(x, y) in 0..4` alive predicate.
    fn height2_from(hc: &mut HashCons, alive: impl Fn(u32, u32) -> bool) -> CellHandle {
        let mut top: [CellHandle; 4] = Default::default();
        for outer in Quadrant::ALL {
            let ox = if outer.is_east() { 2 } else { 0 };
            let oy = if outer.is_south() { 2 } else { 0 };
            let mut mid: [CellHandle; 4] = Default::default();
            for inner in Quadrant::ALL {
                let ix = if inner.is_east() { 1 } else { 0 };
                let iy = if inner.is_south() { 1 } else { 0 };
                if alive(ox + ix, oy + iy) {
                    mid[inner.index()] = hc.on_leaf();
                }
            }
            top[outer.index()] = hc.canonicalize(1, mid);
        }
        hc.canonicalize(2, top)
    }

    #[test]
    fn isolated_cell_dies() {
        let mut hc = HashCons::new();
        let rule = Rule::life();
        let m = height2_from(&mut hc, |x, y| (x, y) == (1, 1));
        let r = result(&mut hc, &rule, &m, 2);
        assert!(r.is_none());
    }

    #[test]
    fn horizontal_triple_becomes_vertical() {
        let mut hc = HashCons::new();
        let rule = Rule::life();
        // A horizontal blinker through the centre row: (0,1),(1,1),(2,1).
        let m = height2_from(&mut hc, |x, y| y == 1 && (0..3).contains(&x));
        let r = result(&mut hc, &rule, &m, 2);
        let node = r.expect("blinker's result is non-empty");
        // The result is height 1 (a 2x2); the centre cell (1,1) survives
        // (2 live neighbours), and (1,0)/(1,2) are born (3 neighbours
        // each), giving a vertical line through the result's NW/SW column.
        assert!(node.child(Quadrant::Nw).is_some());
        assert!(node.child(Quadrant::Sw).is_some());
        assert!(node.child(Quadrant::Ne).is_none());
        assert!(node.child(Quadrant::Se).is_none());
    }

    #[test]
    fn result_is_memoized() {
        let mut hc = HashCons::new();
        let rule = Rule::life();
        let m = height2_from(&mut hc, |x, y| y == 1 && (0..3).contains(&x));
        let first = result(&mut hc, &rule, &m, 2);
        let second = result(&mut hc, &rule, &m, 2);
        assert!(crate::node::same_node(&first, &second));
    }
}
