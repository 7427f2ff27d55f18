use std::collections::VecDeque;

use spade::handles::{FixedDirectedEdgeHandle, FixedVertexHandle};
use spade::{ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation};
use tracing::warn;

use crate::error::{GeometryError, Result};
use crate::math::Point2;
use crate::region::Polygon;

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Triangulates a polygon with holes.
///
/// Triangles wind counter-clockwise. Loop edges that would cross an edge
/// already inserted are skipped with a warning, so self-intersecting input
/// yields a best-effort fill.
///
/// # Errors
///
/// Returns [`GeometryError::Degenerate`] if the outer loop has fewer than
/// three vertices or a vertex cannot be inserted (non-finite or out of
/// range coordinates).
pub fn triangulate_polygon(polygon: &Polygon) -> Result<Vec<[Point2; 3]>> {
    let mut cdt = Cdt::new();
    insert_constraint_loop(&mut cdt, &polygon.outer)?;
    for hole in &polygon.holes {
        if hole.len() >= 3 {
            insert_constraint_loop(&mut cdt, hole)?;
        }
    }

    let material = material_faces(&cdt);
    let to_point = |p: SpadePoint2<f64>| Point2::new(p.x, p.y);
    Ok(cdt
        .inner_faces()
        .filter(|face| material[face.fix().index()])
        .map(|face| face.vertices().map(|v| to_point(v.position())))
        .collect())
}

/// Inserts a closed loop as constraint edges into the CDT.
fn insert_constraint_loop(cdt: &mut Cdt, points: &[Point2]) -> Result<()> {
    if points.len() < 3 {
        return Err(GeometryError::Degenerate("constraint loop needs at least 3 points".into()).into());
    }

    let mut handles: Vec<FixedVertexHandle> = Vec::with_capacity(points.len());
    for p in points {
        let h = cdt
            .insert(SpadePoint2::new(p.x, p.y))
            .map_err(|e: InsertionError| GeometryError::Degenerate(format!("CDT insert: {e}")))?;
        handles.push(h);
    }

    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from == to {
            continue;
        }
        if cdt.can_add_constraint(from, to) {
            cdt.add_constraint(from, to);
        } else {
            warn!(edge = i, "skipping loop edge that crosses an existing constraint");
        }
    }

    Ok(())
}

/// Marks the faces of `cdt` that lie in the polygon's material.
///
/// Every loop edge is a boundary between material and empty space: the outer
/// loop encloses material and each hole loop cuts it away again. Walking
/// from the unbounded face, a face reached across an odd number of loop
/// edges is material; an even count puts it outside or inside a hole. The
/// result is indexed by face index.
fn material_faces(cdt: &Cdt) -> Vec<bool> {
    let mut crossings: Vec<Option<u32>> = vec![None; cdt.num_all_faces()];
    // Directed edges with an already classified face on their left, queued
    // to classify the face on their right.
    let mut frontier: VecDeque<(FixedDirectedEdgeHandle, u32)> = cdt
        .directed_edges()
        .filter(|e| e.face().is_outer())
        .map(|e| (e.fix(), 0))
        .collect();

    while let Some((edge_fix, behind)) = frontier.pop_front() {
        let edge = cdt.directed_edge(edge_fix);
        let Some(face) = edge.rev().face().as_inner() else {
            continue;
        };
        let slot = &mut crossings[face.fix().index()];
        if slot.is_some() {
            continue;
        }
        let count = behind + u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
        *slot = Some(count);
        frontier.extend(face.adjacent_edges().map(|e| (e.fix(), count)));
    }

    crossings.into_iter().map(|c| c.is_some_and(|n| n % 2 == 1)).collect()
}
