use crate::math::polygon_2d::{ensure_orientation, point_in_loop, signed_area, Bounds2d};
use crate::math::{Point2, AREA_EPS};

use super::Polygon;

/// Depth walk limit when following parent links.
const MAX_DEPTH: usize = 1000;

struct LoopEntry {
    points: Vec<Point2>,
    bounds: Bounds2d,
    area: f64,
}

/// Result of nesting resolution for one layer.
pub(super) struct Nesting {
    pub polygons: Vec<Polygon>,
    pub dropped: usize,
}

/// Groups raw loops of one layer into polygons with holes.
///
/// A loop's parent is the smallest strictly larger loop containing its first
/// vertex. Even depth in the parent chain is a filled area, odd depth a hole
/// of its parent. Loops with fewer than four vertices after closing or with
/// area below [`AREA_EPS`] are dropped.
pub(super) fn resolve(loops: Vec<Vec<Point2>>) -> Nesting {
    let mut dropped = 0;
    let mut entries = Vec::with_capacity(loops.len());
    for raw in loops {
        match prepare_loop(raw) {
            Some(entry) => entries.push(entry),
            None => dropped += 1,
        }
    }
    if entries.is_empty() {
        return Nesting {
            polygons: Vec::new(),
            dropped,
        };
    }

    let parent: Vec<Option<usize>> = (0..entries.len())
        .map(|i| find_parent(&entries, i))
        .collect();

    let depth: Vec<usize> = (0..entries.len())
        .map(|i| {
            let mut d = 0;
            let mut cur = parent[i];
            while let Some(p) = cur {
                d += 1;
                if d >= MAX_DEPTH {
                    break;
                }
                cur = parent[p];
            }
            d
        })
        .collect();

    // entry index -> polygon index
    let mut slot: Vec<Option<usize>> = vec![None; entries.len()];
    let mut polygons: Vec<Polygon> = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        if depth[i] % 2 != 0 {
            continue;
        }
        let mut outer = entry.points.clone();
        ensure_orientation(&mut outer, true);
        slot[i] = Some(polygons.len());
        polygons.push(Polygon {
            outer,
            holes: Vec::new(),
        });
    }

    for (i, entry) in entries.iter().enumerate() {
        if depth[i] % 2 == 0 {
            continue;
        }
        let Some(container) = parent[i].and_then(|p| slot[p]) else {
            dropped += 1;
            continue;
        };
        let mut hole = entry.points.clone();
        ensure_orientation(&mut hole, false);
        polygons[container].holes.push(hole);
    }

    Nesting { polygons, dropped }
}

/// Filters non-finite points, validates size and area, and returns the loop
/// in open form.
fn prepare_loop(raw: Vec<Point2>) -> Option<LoopEntry> {
    if raw.len() < 3 {
        return None;
    }
    let mut points: Vec<Point2> = raw
        .into_iter()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect();
    let first = *points.first()?;
    let last = *points.last()?;
    let closed = (first.x - last.x).abs() <= AREA_EPS && (first.y - last.y).abs() <= AREA_EPS;
    if !closed {
        points.push(first);
    }
    if points.len() < 4 {
        return None;
    }
    points.pop();

    let bounds = Bounds2d::of(&points)?;
    let area = signed_area(&points).abs();
    if area <= AREA_EPS {
        return None;
    }
    Some(LoopEntry {
        points,
        bounds,
        area,
    })
}

fn find_parent(entries: &[LoopEntry], i: usize) -> Option<usize> {
    let pt = entries[i].points[0];
    let mut best = None;
    let mut best_area = f64::INFINITY;
    for (j, other) in entries.iter().enumerate() {
        if i == j || other.area <= entries[i].area + AREA_EPS {
            continue;
        }
        if !other.bounds.contains(&pt) || !point_in_loop(&pt, &other.points) {
            continue;
        }
        if other.area < best_area {
            best_area = other.area;
            best = Some(j);
        }
    }
    best
}
