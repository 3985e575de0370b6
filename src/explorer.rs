//! `explore`: window x instant enumeration ("SHOW"), with pruning on the
//! future light cone and region memoization.
//!
//! Grounded in `original_source/hgolbi.c`'s `universe_show_RESULT` and the
//! outer `universe_explore` driver. The thirteen-region recursion reuses
//! [`crate::evolver::build_grid`]/[`crate::evolver::regroup_quadrant`]
//! exactly as the C source's `cell[36]`/`mtemp_5_9`/`unit_10_13` machinery
//! does, rather than re-deriving the decomposition a second time.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;

use crate::bigint::{self, IBig, UBig};
use crate::evolver;
use crate::hashcons::HashCons;
use crate::mutator;
use crate::node::{CellHandle, Quadrant};
use crate::rule::Rule;

/// A closed axis-aligned rectangle in signed 256-bit coordinates,
/// `[nw, se]` inclusive.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub nw: (IBig, IBig),
    pub se: (IBig, IBig),
}

impl Window {
    pub fn new(nw: (IBig, IBig), se: (IBig, IBig)) -> Self {
        Window { nw, se }
    }

    /// The whole representable plane.
    pub fn everything() -> Self {
        Window { nw: (IBig::MIN, IBig::MIN), se: (IBig::MAX, IBig::MAX) }
    }
}

/// Callbacks invoked by [`explore`], mirroring `hgolbi.c`'s `Extractor`:
/// an optional `preaction` before any cell is found, one `foreach` per live
/// cell (in ascending `(y, x)` order), and an optional `postaction` with
/// the final count.
pub trait ExploreCallbacks {
    fn preaction(&mut self, _window: Window, _instant: UBig) {}
    fn foreach(&mut self, x: IBig, y: IBig);
    fn postaction(&mut self, _window: Window, _instant: UBig, _count: UBig) {}
}

/// A spacetime region explored by the SHOW recursion: a height-`h` box with
/// its north-west corner at `(xmin, ymin)` (unsigned domain), whose `m`
/// depicts the pattern as of instant `tbase`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct Region {
    height: u16,
    xmin: UBig,
    ymin: UBig,
    tbase: UBig,
}

/// Unsigned-domain `(xmin, xmax, ymin, ymax)`, inclusive.
type UWindow = (UBig, UBig, UBig, UBig);

fn normalize_and_translate(window: Window) -> UWindow {
    let (mut x0, mut x1) = (window.nw.0, window.se.0);
    if x0 >= x1 {
        x0 = IBig::MIN;
        x1 = IBig::MAX;
    }
    let (mut y0, mut y1) = (window.nw.1, window.se.1);
    if y0 >= y1 {
        y0 = IBig::MIN;
        y1 = IBig::MAX;
    }
    (bigint::signed_to_unsigned(x0), bigint::signed_to_unsigned(x1), bigint::signed_to_unsigned(y0), bigint::signed_to_unsigned(y1))
}

fn space_overlap(height: u16, xmin: UBig, ymin: UBig, window: UWindow) -> bool {
    if height >= 256 {
        return true;
    }
    let side = bigint::side_len(height);
    let xmax = xmin.wrapping_add(side).wrapping_sub(UBig::ONE);
    let ymax = ymin.wrapping_add(side).wrapping_sub(UBig::ONE);
    !(xmax < window.0 || xmin > window.1 || ymax < window.2 || ymin > window.3)
}

fn time_overlap(height: u16, tbase: UBig, instant: UBig) -> bool {
    if height < 2 {
        return false;
    }
    let quarter = bigint::side_len(height - 2);
    instant >= tbase && instant <= tbase.wrapping_add(quarter)
}

/// Whether the box `[xmin, xmin+2^height)` is wholly inside `window`.
fn space_contained(height: u16, xmin: UBig, ymin: UBig, window: UWindow) -> bool {
    if height >= 256 {
        return window.0 == UBig::MIN && window.1 == UBig::MAX && window.2 == UBig::MIN && window.3 == UBig::MAX;
    }
    let side = bigint::side_len(height);
    let xmax = xmin.wrapping_add(side).wrapping_sub(UBig::ONE);
    let ymax = ymin.wrapping_add(side).wrapping_sub(UBig::ONE);
    xmin >= window.0 && xmax <= window.1 && ymin >= window.2 && ymax <= window.3
}

/// Collects every live leaf of `m` (a height-`height` macrocell whose
/// north-west corner is at `(xmin, ymin)` in the unsigned domain) that
/// falls inside `window`. Mirrors `macrocell_get_cells_in_window`.
fn collect_leaves(m: &CellHandle, height: u16, xmin: UBig, ymin: UBig, window: UWindow, found: &mut BTreeSet<(UBig, UBig)>) {
    let node = match m {
        None => return,
        Some(node) => node,
    };
    if !space_overlap(height, xmin, ymin, window) {
        return;
    }
    if height == 0 {
        found.insert((ymin, xmin));
        return;
    }
    let half = bigint::side_len(height - 1);
    for q in Quadrant::ALL {
        let cxmin = if q.is_east() { xmin.wrapping_add(half) } else { xmin };
        let cymin = if q.is_south() { ymin.wrapping_add(half) } else { ymin };
        collect_leaves(node.child(q), height - 1, cxmin, cymin, window, found);
    }
}

/// Recursive SHOW: explores the future light cone of `m` (region `r`),
/// emitting every live cell it finds inside `window` at `instant` into
/// `found`. Mirrors `universe_show_RESULT`, minus the "harvest result into
/// a 36-cell array" bookkeeping: [`evolver::build_grid`] recomputes (and
/// re-memoizes, at no extra cost) exactly the same `result`s independently.
#[allow(clippy::too_many_arguments)]
fn show(hc: &mut HashCons, rule: &Rule, m: &CellHandle, r: Region, window: UWindow, instant: UBig, found: &mut BTreeSet<(UBig, UBig)>, explored: &mut FxHashSet<Region>) {
    if m.is_none() || r.height < 2 {
        return;
    }
    if !time_overlap(r.height, r.tbase, instant) || !space_overlap(r.height, r.xmin, r.ymin, window) {
        return;
    }
    if !explored.insert(r) {
        return;
    }

    let quarter = bigint::side_len(r.height - 2);
    let delta_t = instant - r.tbase;

    if delta_t.is_zero() {
        collect_leaves(m, r.height, r.xmin, r.ymin, window, found);
        return;
    }
    if delta_t == quarter {
        let half_result = evolver::result(hc, rule, m, r.height);
        collect_leaves(&half_result, r.height - 1, r.xmin.wrapping_add(quarter), r.ymin.wrapping_add(quarter), window, found);
        return;
    }

    // 0 < delta_t < quarter, which (since quarter = 2^(h-2)) can only occur
    // for height >= 3, exactly where build_grid's own height-2 >= 1
    // canonicalizations and height-1 >= 2 `result` calls are well-defined.
    let node = m.as_ref().expect("checked m.is_none() above");

    // Each child's own side is `2^(h-1) = 2*quarter`, so its NW corner is
    // offset by a full child-side, not by `quarter` (a common-off-by-a-
    // factor-of-two trap: `quarter` is the right offset for the *overlapping*
    // concentric squares below, not for these non-overlapping children).
    let child_side = bigint::side_len(r.height - 1);
    for q in Quadrant::ALL {
        let child = node.child(q).clone();
        let r2 = Region {
            height: r.height - 1,
            xmin: if q.is_east() { r.xmin.wrapping_add(child_side) } else { r.xmin },
            ymin: if q.is_south() { r.ymin.wrapping_add(child_side) } else { r.ymin },
            tbase: r.tbase,
        };
        show(hc, rule, &child, r2, window, instant, found, explored);
    }

    let grid = evolver::build_grid(hc, rule, m, r.height);
    let eighth = bigint::shr(quarter, 1);
    for u in Quadrant::ALL {
        let mtemp = evolver::regroup_quadrant(hc, &grid, r.height, u);
        let r2 = Region {
            height: r.height - 1,
            xmin: r.xmin.wrapping_add(eighth).wrapping_add(if u.is_east() { quarter } else { UBig::ZERO }),
            ymin: r.ymin.wrapping_add(eighth).wrapping_add(if u.is_south() { quarter } else { UBig::ZERO }),
            tbase: r.tbase.wrapping_add(eighth),
        };
        show(hc, rule, &mtemp, r2, window, instant, found, explored);
    }
}

/// `2 + ceil(log2(max(1, instant)))`: the minimum root height whose light
/// cone at `instant` generations can possibly reach every corner of an
/// arbitrarily large/remote query window. Mirrors the bit-counting loop in
/// `universe_explore`.
fn min_height_for_instant(instant: UBig) -> u16 {
    let mut min_height = 2u16;
    if instant.is_zero() {
        return min_height;
    }
    let mut t = instant - UBig::ONE;
    while !t.is_zero() {
        t = bigint::shr(t, 1);
        min_height += 1;
    }
    min_height
}

/// Whether the root's one-step frontier (the twelve border sub-quadrants
/// at depth 2) is vacuum, i.e. the root is *not* `is_closed` in
/// `hgolbi.c`'s terms: every grandchild of the root except the one facing
/// the centre is absent.
fn frontier_is_vacuum(root: &CellHandle, height: u16) -> bool {
    let node = match root {
        None => return true,
        Some(node) => node,
    };
    if height == 0 {
        return true;
    }
    if height == 1 {
        return node.children().iter().all(Option::is_none);
    }
    for i in Quadrant::ALL {
        if let Some(grandparent) = node.child(i) {
            for j in Quadrant::ALL {
                if j != i.opposite() && grandparent.child(j).is_some() {
                    return false;
                }
            }
        }
    }
    true
}

/// Grows the universe (re-embedding the root, as the Mutator does) until
/// its height is at least `min_height` and its frontier is vacuum.
fn expand_until_ready(hc: &mut HashCons, root: &mut CellHandle, height: &mut u16, x0: &mut IBig, y0: &mut IBig, min_height: u16) {
    while (*height < min_height || !frontier_is_vacuum(root, *height)) && *height < 256 {
        mutator::expand_once(hc, root, height, x0, y0);
    }
}

/// `(outer-quadrant-child-of-root-child).child(opposite)`, the re-embedding
/// the C source performs once and reuses across all four shifted
/// universes: every shifted universe places the exact same "one extra
/// layer of vacuum buffer around the root" pattern, just in a different
/// quadrant slot and at a different spacetime offset.
fn buffered_root(hc: &mut HashCons, root: &CellHandle, height: u16) -> CellHandle {
    let mut children: [CellHandle; 4] = Default::default();
    for q in Quadrant::ALL {
        let grandchild = match root {
            None => None,
            Some(node) => node.child(q).as_ref().and_then(|child| child.child(q.opposite()).clone()),
        };
        children[q.index()] = grandchild;
    }
    hc.canonicalize(height - 1, children)
}

/// Enumerates, in ascending `(y, x)` order, every live cell in `window` at
/// `instant`, invoking `callbacks` and returning the count. Mirrors
/// `universe_explore`: `instant == 0` is a direct leaf collection off the
/// current root; `instant > 0` expands the universe until its future light
/// cone entirely covers any query, then SHOWs four quarter-shifted
/// universes tiling the reachable future.
#[allow(clippy::too_many_arguments)]
pub fn explore(
    hc: &mut HashCons,
    rule: &Rule,
    root: &mut CellHandle,
    height: &mut u16,
    x0: &mut IBig,
    y0: &mut IBig,
    window: Window,
    instant: UBig,
    callbacks: &mut dyn ExploreCallbacks,
) -> UBig {
    callbacks.preaction(window, instant);

    let uwindow = normalize_and_translate(window);
    let mut found: BTreeSet<(UBig, UBig)> = BTreeSet::default();

    if root.is_some() {
        if instant.is_zero() {
            let ux0 = bigint::signed_to_unsigned(*x0);
            let uy0 = bigint::signed_to_unsigned(*y0);
            collect_leaves(root, *height, ux0, uy0, uwindow, &mut found);
        } else {
            let min_height = min_height_for_instant(instant);
            expand_until_ready(hc, root, height, x0, y0, min_height);

            let quarter = bigint::side_len(*height - 2);
            let ux0 = bigint::signed_to_unsigned(*x0);
            let uy0 = bigint::signed_to_unsigned(*y0);
            let inner = buffered_root(hc, root, *height);

            let mut explored: FxHashSet<Region> = FxHashSet::default();
            for u in Quadrant::ALL {
                let mut shifted_children: [CellHandle; 4] = Default::default();
                shifted_children[u.index()] = inner.clone();
                let shifted = hc.canonicalize(*height, shifted_children);
                evolver::result(hc, rule, &shifted, *height);

                let xmin = if u.is_east() { ux0.wrapping_sub(quarter) } else { ux0.wrapping_add(quarter) };
                let ymin = if u.is_south() { uy0.wrapping_sub(quarter) } else { uy0.wrapping_add(quarter) };
                let r = Region { height: *height, xmin, ymin, tbase: UBig::ZERO };
                show(hc, rule, &shifted, r, uwindow, instant, &mut found, &mut explored);
            }
        }
    }

    for &(y, x) in &found {
        callbacks.foreach(bigint::unsigned_to_signed(x), bigint::unsigned_to_signed(y));
    }

    let count = UBig::from(found.len() as u64);
    callbacks.postaction(window, instant, count);
    count
}

/// Population restricted to `window`: walks only subtrees whose box
/// intersects `window`, returning cached `population` for any subtree
/// wholly contained in it without descending further.
pub fn population_in_window(root: &CellHandle, height: u16, x0: IBig, y0: IBig, window: Window) -> UBig {
    let uwindow = normalize_and_translate(window);
    let ux0 = bigint::signed_to_unsigned(x0);
    let uy0 = bigint::signed_to_unsigned(y0);
    population_in_window_rec(root, height, ux0, uy0, uwindow)
}

fn population_in_window_rec(m: &CellHandle, height: u16, xmin: UBig, ymin: UBig, window: UWindow) -> UBig {
    let node = match m {
        None => return UBig::ZERO,
        Some(node) => node,
    };
    if !space_overlap(height, xmin, ymin, window) {
        return UBig::ZERO;
    }
    if space_contained(height, xmin, ymin, window) {
        return node.population;
    }
    if height == 0 {
        return node.population;
    }
    let half = bigint::side_len(height - 1);
    let mut total = UBig::ZERO;
    for q in Quadrant::ALL {
        let cxmin = if q.is_east() { xmin.wrapping_add(half) } else { xmin };
        let cymin = if q.is_south() { ymin.wrapping_add(half) } else { ymin };
        total += population_in_window_rec(node.child(q), height - 1, cxmin, cymin, window);
    }
    total
}
