//! Ring stitching and even-odd nesting.

use std::collections::HashMap;

use geo::orient::{Direction, Orient};
use geo::{Area, BoundingRect, Contains, Coord, LineString, MultiPolygon, Polygon, Rect};

use super::AssemblyProblem;
use crate::index::NodeRef;

/// Join way segments end to end into closed rings.
///
/// Segments are matched by node id and may be walked in either direction. A
/// ring also closes when its last node sits on the location of its first.
/// Segments with fewer than two nodes are ignored.
pub(crate) fn stitch(segments: &[&[NodeRef]]) -> Result<Vec<LineString<f64>>, AssemblyProblem> {
    let segments: Vec<&[NodeRef]> = segments
        .iter()
        .copied()
        .filter(|segment| segment.len() >= 2)
        .collect();
    if segments.is_empty() {
        return Err(AssemblyProblem::NoRings);
    }

    let mut endpoints: HashMap<i64, Vec<(usize, bool)>> = HashMap::new();
    for (position, segment) in segments.iter().enumerate() {
        if let (Some(first), Some(last)) = (segment.first(), segment.last()) {
            endpoints.entry(first.id).or_default().push((position, true));
            endpoints.entry(last.id).or_default().push((position, false));
        }
    }

    let mut used = vec![false; segments.len()];
    let mut rings = Vec::new();
    for start in 0..segments.len() {
        if used.get(start).copied().unwrap_or(true) {
            continue;
        }
        let ring = walk_ring(&segments, &endpoints, &mut used, start)?;
        rings.push(to_line_string(&ring)?);
    }
    Ok(rings)
}

fn walk_ring(
    segments: &[&[NodeRef]],
    endpoints: &HashMap<i64, Vec<(usize, bool)>>,
    used: &mut [bool],
    start: usize,
) -> Result<Vec<NodeRef>, AssemblyProblem> {
    let mut ring: Vec<NodeRef> = Vec::new();
    let mut current = start;
    let mut forward = true;
    loop {
        if let Some(flag) = used.get_mut(current) {
            *flag = true;
        }
        let segment = segments.get(current).copied().unwrap_or_default();
        let skip = usize::from(!ring.is_empty());
        if forward {
            ring.extend(segment.iter().skip(skip));
        } else {
            ring.extend(segment.iter().rev().skip(skip));
        }

        let (Some(head), Some(tail)) = (ring.first().copied(), ring.last().copied()) else {
            return Err(AssemblyProblem::NoRings);
        };
        if ring.len() > 1 && ends_meet(head, tail) {
            if ring.len() < 4 {
                return Err(AssemblyProblem::TooFewNodes {
                    start: head.id,
                    nodes: ring.len(),
                });
            }
            return Ok(ring);
        }

        let next = endpoints.get(&tail.id).and_then(|candidates| {
            candidates
                .iter()
                .copied()
                .find(|&(position, _)| !used.get(position).copied().unwrap_or(true))
        });
        match next {
            Some((position, at_start)) => {
                current = position;
                forward = at_start;
            }
            None => {
                return Err(AssemblyProblem::OpenRing {
                    start: head.id,
                    end: tail.id,
                });
            }
        }
    }
}

fn ends_meet(head: NodeRef, tail: NodeRef) -> bool {
    head.id == tail.id || (head.location.is_some() && head.location == tail.location)
}

fn to_line_string(ring: &[NodeRef]) -> Result<LineString<f64>, AssemblyProblem> {
    ring.iter()
        .map(|node| {
            node.location
                .map(|location| location.to_coord())
                .ok_or(AssemblyProblem::MissingLocation { node: node.id })
        })
        .collect::<Result<Vec<Coord<f64>>, _>>()
        .map(LineString::new)
}

struct NestedRing {
    polygon: Polygon<f64>,
    bounds: Option<Rect<f64>>,
    area: f64,
}

impl NestedRing {
    fn new(ring: LineString<f64>) -> Self {
        let polygon = Polygon::new(ring, Vec::new());
        let bounds = polygon.bounding_rect();
        let area = polygon.unsigned_area();
        Self {
            polygon,
            bounds,
            area,
        }
    }

    fn may_contain(&self, other: &Self) -> bool {
        match (self.bounds, other.bounds) {
            (Some(outer), Some(inner)) => {
                outer.min().x <= inner.min().x
                    && outer.min().y <= inner.min().y
                    && outer.max().x >= inner.max().x
                    && outer.max().y >= inner.max().y
            }
            _ => false,
        }
    }

    fn contains(&self, other: &Self) -> bool {
        self.may_contain(other) && self.polygon.contains(other.polygon.exterior())
    }
}

/// Arrange closed rings into polygons with holes.
///
/// Each ring's parent is the smallest ring that contains it. Rings at even
/// depth become shells and rings at odd depth become holes of their parent.
/// Shells are wound counter-clockwise and holes clockwise.
pub(crate) fn nest(rings: Vec<LineString<f64>>) -> MultiPolygon<f64> {
    let mut nested: Vec<NestedRing> = rings.into_iter().map(NestedRing::new).collect();
    nested.sort_by(|a, b| b.area.total_cmp(&a.area));

    // Per ring: depth and, for shells, the output polygon slot.
    let mut depth: Vec<usize> = Vec::with_capacity(nested.len());
    let mut slot: Vec<Option<usize>> = Vec::with_capacity(nested.len());
    let mut shells: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();

    for (position, ring) in nested.iter().enumerate() {
        let parent = nested
            .get(..position)
            .unwrap_or_default()
            .iter()
            .rposition(|candidate| candidate.contains(ring));
        let ring_depth = parent
            .and_then(|parent| depth.get(parent).copied())
            .map_or(0, |parent_depth| parent_depth + 1);
        depth.push(ring_depth);

        let exterior = ring.polygon.exterior().clone();
        let parent_slot = parent.and_then(|parent| slot.get(parent).copied().flatten());
        match parent_slot {
            Some(shell) if ring_depth % 2 == 1 => {
                if let Some((_, holes)) = shells.get_mut(shell) {
                    holes.push(exterior);
                }
                slot.push(None);
            }
            _ => {
                slot.push(Some(shells.len()));
                shells.push((exterior, Vec::new()));
            }
        }
    }

    let polygons = shells
        .into_iter()
        .map(|(exterior, holes)| Polygon::new(exterior, holes))
        .collect();
    MultiPolygon::new(polygons).orient(Direction::Default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Location;
    use geo::Winding;
    use rstest::rstest;

    fn nodes(points: &[(i64, f64, f64)]) -> Vec<NodeRef> {
        points
            .iter()
            .map(|&(id, lon, lat)| NodeRef {
                id,
                location: Location::from_degrees(lon, lat),
            })
            .collect()
    }

    fn square(first_id: i64, min: f64, max: f64) -> Vec<NodeRef> {
        nodes(&[
            (first_id, min, min),
            (first_id + 1, max, min),
            (first_id + 2, max, max),
            (first_id + 3, min, max),
            (first_id, min, min),
        ])
    }

    #[rstest]
    fn stitches_split_and_reversed_segments() {
        let south = nodes(&[(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 1.0, 1.0)]);
        // Walked backwards: 1 <- 4 <- 3.
        let north = nodes(&[(1, 0.0, 0.0), (4, 0.0, 1.0), (3, 1.0, 1.0)]);
        let rings = stitch(&[&south, &north]).expect("closed ring");
        assert_eq!(rings.len(), 1);
        let ring = rings.first().expect("one ring");
        assert_eq!(ring.0.len(), 5);
        assert_eq!(ring.0.first(), ring.0.last());
    }

    #[rstest]
    fn reports_open_rings() {
        let open = nodes(&[(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 1.0, 1.0)]);
        assert_eq!(
            stitch(&[&open]),
            Err(AssemblyProblem::OpenRing { start: 1, end: 3 })
        );
    }

    #[rstest]
    fn reports_degenerate_rings() {
        let spike = nodes(&[(1, 0.0, 0.0), (2, 1.0, 0.0), (1, 0.0, 0.0)]);
        assert_eq!(
            stitch(&[&spike]),
            Err(AssemblyProblem::TooFewNodes { start: 1, nodes: 3 })
        );
    }

    #[rstest]
    fn reports_missing_locations() {
        let mut ring = square(1, 0.0, 1.0);
        if let Some(node) = ring.get_mut(2) {
            node.location = None;
        }
        assert_eq!(
            stitch(&[&ring]),
            Err(AssemblyProblem::MissingLocation { node: 3 })
        );
    }

    #[rstest]
    fn closes_rings_on_a_shared_location() {
        let ring = nodes(&[
            (1, 0.0, 0.0),
            (2, 1.0, 0.0),
            (3, 1.0, 1.0),
            (9, 0.0, 0.0),
        ]);
        let rings = stitch(&[&ring]).expect("closed by location");
        let closed = rings.first().expect("one ring");
        assert_eq!(closed.0.len(), 4);
        assert!(closed.is_closed());
    }

    #[rstest]
    fn rejects_empty_input() {
        assert_eq!(stitch(&[]), Err(AssemblyProblem::NoRings));
    }

    #[rstest]
    fn nests_rings_even_odd() {
        let outer = square(1, 0.0, 10.0);
        let hole = square(11, 2.0, 8.0);
        let island = square(21, 4.0, 6.0);
        let separate = square(31, 20.0, 21.0);
        let rings = stitch(&[&island, &outer, &separate, &hole]).expect("closed rings");
        let geometry = nest(rings);

        assert_eq!(geometry.0.len(), 3);
        let holes: Vec<usize> = geometry.iter().map(|polygon| polygon.interiors().len()).collect();
        assert_eq!(holes, vec![1, 0, 0]);
        for polygon in &geometry {
            assert!(polygon.exterior().is_ccw());
            assert!(polygon.interiors().iter().all(|ring| ring.is_cw()));
        }
    }
}
