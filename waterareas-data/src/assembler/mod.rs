//! Multipolygon assembly.
//!
//! Areas come from two sources: closed ways, which are turned into polygons
//! as soon as they are read, and `multipolygon`/`boundary` relations, which
//! are assembled once the last of their member ways has been seen. The
//! relation scan therefore has to run before the main pass.
//!
//! A way that belongs to a tracked relation is never an area on its own.
//! The exception is an inner member whose tags differ from the area it cuts
//! a hole into: it becomes a separate way area once its relation is done.

use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::ops::ControlFlow;

use log::{debug, warn};
use thiserror::Error;
use waterareas_core::{AreaOrigin, AssembledArea, TagSet};

use crate::index::{LocationHandler, NodeRef};
use crate::source::{ElementScope, MemberKind, OsmElement, OsmInput, ReadError, Relation, Way};

mod rings;

/// Relation `type` values assembled into areas.
pub const AREA_RELATION_TYPES: [&str; 2] = ["multipolygon", "boundary"];

/// Assembler settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Diagnostic verbosity; problems are logged from level 1.
    pub debug_level: u8,
}

/// Reasons an area could not be assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AssemblyProblem {
    /// No member way contributed any nodes.
    #[error("no usable member ways")]
    NoRings,
    /// Segments could not be joined into a closed ring.
    #[error("ring starting at node {start} ends at node {end} without closing")]
    OpenRing {
        /// First node of the partial ring.
        start: i64,
        /// Node where stitching stopped.
        end: i64,
    },
    /// A closed ring has fewer than four nodes.
    #[error("ring starting at node {start} has only {nodes} nodes")]
    TooFewNodes {
        /// First node of the ring.
        start: i64,
        /// Number of nodes including the closing one.
        nodes: usize,
    },
    /// A node referenced by a ring has no location.
    #[error("node {node} has no location")]
    MissingLocation {
        /// Node id.
        node: i64,
    },
}

/// Receiver of assembled areas.
pub trait AreaSink {
    /// Error that aborts assembly.
    type Error;

    /// Return false to skip assembling objects with these tags.
    fn accepts(&self, tags: &TagSet) -> bool {
        let _ = tags;
        true
    }

    /// Take ownership of an assembled area.
    fn area(&mut self, area: AssembledArea) -> Result<(), Self::Error>;
}

impl AreaSink for Vec<AssembledArea> {
    type Error = Infallible;

    fn area(&mut self, area: AssembledArea) -> Result<(), Self::Error> {
        self.push(area);
        Ok(())
    }
}

/// Counters collected while assembling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    /// Area relations tracked by the relation scan, wanted or not.
    pub relations_tracked: u64,
    /// Areas emitted from closed ways.
    pub way_areas: u64,
    /// Areas emitted from relations.
    pub relation_areas: u64,
    /// Relations still missing member ways after the main pass.
    pub relations_incomplete: u64,
    /// Objects whose geometry could not be assembled.
    pub failures: u64,
}

#[derive(Debug)]
struct PendingRelation {
    id: i64,
    tags: TagSet,
    old_style: bool,
    // False when the relation is tracked only to report it incomplete.
    wanted: bool,
    members: Vec<(i64, bool)>,
    missing: usize,
    done: bool,
}

#[derive(Debug)]
struct MemberWay {
    nodes: Vec<NodeRef>,
    tags: TagSet,
    closed: bool,
    emitted: bool,
    users: usize,
}

/// Tracks area relations and assembles areas from ways as they stream by.
///
/// # Examples
/// ```
/// use waterareas_core::{AssembledArea, TagSet};
/// use waterareas_data::{
///     AssemblerConfig, IndexType, LocationHandler, MultipolygonCollector, Way, create_index,
/// };
///
/// let mut locations = LocationHandler::new(create_index(IndexType::SparseMemMap));
/// for (id, lon, lat) in [(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 1.0, 1.0), (4, 0.0, 1.0)] {
///     locations.node(id, lon, lat);
/// }
/// let way = Way {
///     id: 7,
///     refs: vec![1, 2, 3, 4, 1],
///     tags: TagSet::from_pairs([("natural", "water")]),
/// };
///
/// let mut collector = MultipolygonCollector::new(AssemblerConfig::default());
/// let mut areas: Vec<AssembledArea> = Vec::new();
/// collector.handle_way(&way, &mut locations, &mut areas).expect("vector sink");
/// assert_eq!(areas.len(), 1);
/// assert_eq!(areas[0].id, 14);
/// ```
#[derive(Debug, Default)]
pub struct MultipolygonCollector {
    config: AssemblerConfig,
    relations: Vec<PendingRelation>,
    waiting: HashMap<i64, Vec<usize>>,
    ways: HashMap<i64, MemberWay>,
    stats: AssemblerStats,
}

impl MultipolygonCollector {
    /// Create an empty collector.
    pub fn new(config: AssemblerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Scan `input` for area relations.
    ///
    /// Every `multipolygon` and `boundary` relation with way members is
    /// tracked so that missing members can be reported. Only relations whose
    /// tags pass `accepts`, and old-style relations whose tags are not known
    /// yet, are assembled.
    pub fn read_relations<F>(&mut self, input: &OsmInput, accepts: F) -> Result<(), ReadError>
    where
        F: Fn(&TagSet) -> bool,
    {
        input.read(ElementScope::Relations, |element| {
            if let OsmElement::Relation(relation) = element {
                self.add_relation(relation, &accepts);
            }
            ControlFlow::Continue(())
        })
    }

    /// Track a relation if it describes an area.
    ///
    /// Returns true when the relation is tracked. `accepts` only decides
    /// whether its geometry is assembled.
    pub fn add_relation<F>(&mut self, relation: Relation, accepts: F) -> bool
    where
        F: Fn(&TagSet) -> bool,
    {
        let is_area_type = relation
            .tags
            .get("type")
            .is_some_and(|kind| AREA_RELATION_TYPES.contains(&kind));
        if !is_area_type {
            return false;
        }

        let mut seen = HashSet::new();
        let members: Vec<(i64, bool)> = relation
            .members
            .iter()
            .filter(|member| member.kind == MemberKind::Way && seen.insert(member.id))
            .map(|member| (member.id, matches!(member.role.as_str(), "outer" | "")))
            .collect();
        if members.is_empty() {
            return false;
        }

        let tags = relation.tags.without("type");
        let old_style = tags.is_empty();
        let wanted = old_style || accepts(&tags);

        let position = self.relations.len();
        for &(way_id, _) in &members {
            self.waiting.entry(way_id).or_default().push(position);
        }
        self.relations.push(PendingRelation {
            id: relation.id,
            tags,
            old_style,
            wanted,
            missing: members.len(),
            members,
            done: false,
        });
        self.stats.relations_tracked += 1;
        true
    }

    /// Handle a way from the main pass.
    ///
    /// Closed ways accepted by the sink become areas immediately, unless
    /// they are members of a tracked relation. Member ways are kept until
    /// their relations complete.
    pub fn handle_way<S: AreaSink>(
        &mut self,
        way: &Way,
        locations: &mut LocationHandler,
        sink: &mut S,
    ) -> Result<(), S::Error> {
        let way_accepted = may_be_area(way) && sink.accepts(&way.tags);
        let Some(relations) = self.waiting.remove(&way.id) else {
            if way_accepted {
                let nodes = locations.resolve(&way.refs);
                if is_closed_area(way, &nodes) {
                    self.assemble_way(way.id, way.tags.clone(), &nodes, sink)?;
                }
            }
            return Ok(());
        };

        let keep = way_accepted
            || relations.iter().any(|&position| {
                self.relations
                    .get(position)
                    .is_some_and(|relation| relation.wanted)
            });
        let member = if keep {
            let nodes = locations.resolve(&way.refs);
            MemberWay {
                closed: way_accepted && is_closed_area(way, &nodes),
                nodes,
                tags: way.tags.clone(),
                emitted: false,
                users: relations.len(),
            }
        } else {
            MemberWay {
                nodes: Vec::new(),
                tags: TagSet::new(),
                closed: false,
                emitted: false,
                users: relations.len(),
            }
        };
        self.ways.insert(way.id, member);
        for position in relations {
            let Some(relation) = self.relations.get_mut(position) else {
                continue;
            };
            relation.missing = relation.missing.saturating_sub(1);
            if relation.missing == 0 && !relation.done {
                self.assemble_relation(position, sink)?;
            }
        }
        Ok(())
    }

    /// Assemble relations that are still missing member ways from whatever
    /// members were found, and return their ids in input order.
    pub fn finish<S: AreaSink>(&mut self, sink: &mut S) -> Result<Vec<i64>, S::Error> {
        let mut incomplete = Vec::new();
        for position in 0..self.relations.len() {
            let Some(relation) = self.relations.get(position) else {
                continue;
            };
            if relation.done {
                continue;
            }
            incomplete.push(relation.id);
            let any_member = relation
                .members
                .iter()
                .any(|(way_id, _)| self.ways.contains_key(way_id));
            if any_member {
                self.assemble_relation(position, sink)?;
            } else if let Some(relation) = self.relations.get_mut(position) {
                relation.done = true;
            }
        }
        self.stats.relations_incomplete = incomplete.len() as u64;
        self.waiting.clear();
        self.ways.clear();
        Ok(incomplete)
    }

    /// Counters collected so far.
    pub const fn stats(&self) -> AssemblerStats {
        self.stats
    }

    fn assemble_way<S: AreaSink>(
        &mut self,
        way_id: i64,
        tags: TagSet,
        nodes: &[NodeRef],
        sink: &mut S,
    ) -> Result<(), S::Error> {
        match rings::stitch(&[nodes]) {
            Ok(rings) => {
                let geometry = rings::nest(rings);
                self.emit(AreaOrigin::Way, way_id, tags, geometry, sink)
            }
            Err(problem) => {
                self.report(AreaOrigin::Way, way_id, problem);
                Ok(())
            }
        }
    }

    fn assemble_relation<S: AreaSink>(
        &mut self,
        position: usize,
        sink: &mut S,
    ) -> Result<(), S::Error> {
        let Some(relation) = self.relations.get_mut(position) else {
            return Ok(());
        };
        relation.done = true;
        let id = relation.id;
        let wanted = relation.wanted;
        let members = std::mem::take(&mut relation.members);
        let tags = if relation.old_style {
            common_outer_tags(&members, &self.ways)
        } else {
            std::mem::take(&mut relation.tags)
        };

        let outcome = if wanted && sink.accepts(&tags) {
            let segments: Vec<&[NodeRef]> = members
                .iter()
                .filter_map(|(way_id, _)| self.ways.get(way_id))
                .map(|way| way.nodes.as_slice())
                .collect();
            Some(rings::stitch(&segments).map(rings::nest))
        } else {
            None
        };
        let separate = self.separate_inner_ways(&members, &tags);
        self.release(&members);

        match outcome {
            Some(Ok(geometry)) => self.emit(AreaOrigin::Relation, id, tags, geometry, sink)?,
            Some(Err(problem)) => self.report(AreaOrigin::Relation, id, problem),
            None => {}
        }
        for (way_id, way_tags, nodes) in separate {
            self.assemble_way(way_id, way_tags, &nodes, sink)?;
        }
        Ok(())
    }

    /// Take the closed inner ways whose own tags describe something other
    /// than the area they belong to. Each is handed out once.
    fn separate_inner_ways(
        &mut self,
        members: &[(i64, bool)],
        area_tags: &TagSet,
    ) -> Vec<(i64, TagSet, Vec<NodeRef>)> {
        let mut separate = Vec::new();
        for (way_id, is_outer) in members {
            if *is_outer {
                continue;
            }
            let Some(way) = self.ways.get_mut(way_id) else {
                continue;
            };
            if !way.closed
                || way.emitted
                || way.tags.is_empty()
                || way.tags.same_tags(area_tags)
            {
                continue;
            }
            way.emitted = true;
            separate.push((*way_id, way.tags.clone(), way.nodes.clone()));
        }
        separate
    }

    fn release(&mut self, members: &[(i64, bool)]) {
        for (way_id, _) in members {
            if let Some(way) = self.ways.get_mut(way_id) {
                way.users = way.users.saturating_sub(1);
                if way.users == 0 {
                    self.ways.remove(way_id);
                }
            }
        }
    }

    fn emit<S: AreaSink>(
        &mut self,
        origin: AreaOrigin,
        orig_id: i64,
        tags: TagSet,
        geometry: geo::MultiPolygon<f64>,
        sink: &mut S,
    ) -> Result<(), S::Error> {
        let Some(area) = AssembledArea::new(origin, orig_id, tags, geometry) else {
            warn!("Skipping {origin} {orig_id}: area id out of range");
            self.stats.failures += 1;
            return Ok(());
        };
        match origin {
            AreaOrigin::Way => self.stats.way_areas += 1,
            AreaOrigin::Relation => self.stats.relation_areas += 1,
        }
        sink.area(area)
    }

    fn report(&mut self, origin: AreaOrigin, id: i64, problem: AssemblyProblem) {
        self.stats.failures += 1;
        if self.config.debug_level >= 1 {
            debug!("Failed to assemble area from {origin} {id}: {problem}");
        }
    }
}

/// Return true for ways that describe an area on their own.
///
/// `nodes` are the way's resolved node references. The ends meet when they
/// share a node id or, failing that, the same location.
pub fn is_closed_area(way: &Way, nodes: &[NodeRef]) -> bool {
    may_be_area(way) && (way.is_closed() || ends_share_location(nodes))
}

fn may_be_area(way: &Way) -> bool {
    way.refs.len() >= 4 && !way.tags.has("area", "no")
}

fn ends_share_location(nodes: &[NodeRef]) -> bool {
    match (nodes.first(), nodes.last()) {
        (Some(first), Some(last)) => first.location.is_some() && first.location == last.location,
        _ => false,
    }
}

fn common_outer_tags(members: &[(i64, bool)], ways: &HashMap<i64, MemberWay>) -> TagSet {
    let mut outer = members
        .iter()
        .filter(|(_, is_outer)| *is_outer)
        .filter_map(|(way_id, _)| ways.get(way_id));
    let Some(first) = outer.next() else {
        return TagSet::new();
    };
    let mut common = first.tags.clone();
    for way in outer {
        common.retain_common(&way.tags);
    }
    common
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexType, create_index};
    use crate::source::Member;
    use rstest::{fixture, rstest};

    /// Sink that only accepts `natural=water`.
    #[derive(Default)]
    struct WaterSink(Vec<AssembledArea>);

    impl AreaSink for WaterSink {
        type Error = Infallible;

        fn accepts(&self, tags: &TagSet) -> bool {
            tags.has("natural", "water")
        }

        fn area(&mut self, area: AssembledArea) -> Result<(), Self::Error> {
            self.0.push(area);
            Ok(())
        }
    }

    #[fixture]
    fn locations() -> LocationHandler {
        let mut handler = LocationHandler::new(create_index(IndexType::SparseMemMap));
        let grid = [
            (1, 0.0, 0.0),
            (2, 4.0, 0.0),
            (3, 4.0, 4.0),
            (4, 0.0, 4.0),
            (5, 1.0, 1.0),
            (6, 2.0, 1.0),
            (7, 2.0, 2.0),
            (8, 1.0, 2.0),
            // Duplicate of node 1's location.
            (9, 0.0, 0.0),
        ];
        for (id, lon, lat) in grid {
            handler.node(id, lon, lat);
        }
        handler
    }

    fn way(id: i64, refs: &[i64], tags: &[(&str, &str)]) -> Way {
        Way {
            id,
            refs: refs.to_vec(),
            tags: TagSet::from_pairs(tags.iter().copied()),
        }
    }

    fn relation(id: i64, tags: &[(&str, &str)], members: &[(i64, &str)]) -> Relation {
        Relation {
            id,
            members: members
                .iter()
                .map(|&(way_id, role)| Member {
                    kind: MemberKind::Way,
                    id: way_id,
                    role: role.to_owned(),
                })
                .collect(),
            tags: TagSet::from_pairs(tags.iter().copied()),
        }
    }

    #[rstest]
    #[case(&[1, 2, 3, 4, 1], &[], true)]
    #[case(&[1, 2, 3, 4, 1], &[("area", "no")], false)]
    #[case(&[1, 2, 3, 4], &[], false)]
    #[case(&[1, 2, 1], &[], false)]
    #[case(&[1, 2, 3, 9], &[], true)]
    #[case(&[1, 2, 3, 404], &[], false)]
    fn recognises_closed_areas(
        mut locations: LocationHandler,
        #[case] refs: &[i64],
        #[case] tags: &[(&str, &str)],
        #[case] expected: bool,
    ) {
        let nodes = locations.resolve(refs);
        assert_eq!(is_closed_area(&way(1, refs, tags), &nodes), expected);
    }

    #[rstest]
    fn way_closed_by_location_becomes_an_area(mut locations: LocationHandler) {
        let mut collector = MultipolygonCollector::default();
        let mut sink = WaterSink::default();
        let pond = way(12, &[1, 2, 3, 4, 9], &[("natural", "water")]);
        collector
            .handle_way(&pond, &mut locations, &mut sink)
            .expect("infallible sink");
        let area = sink.0.first().expect("pond area");
        assert_eq!((area.id, area.origin), (24, AreaOrigin::Way));
        assert_eq!(collector.stats().failures, 0);
    }

    #[rstest]
    fn assembles_closed_water_way(mut locations: LocationHandler) {
        let mut collector = MultipolygonCollector::new(AssemblerConfig::default());
        let mut sink = WaterSink::default();
        let lake = way(10, &[1, 2, 3, 4, 1], &[("natural", "water")]);
        let building = way(11, &[5, 6, 7, 8, 5], &[("building", "yes")]);
        for candidate in [&lake, &building] {
            collector
                .handle_way(candidate, &mut locations, &mut sink)
                .expect("infallible sink");
        }
        assert_eq!(sink.0.len(), 1);
        let area = sink.0.first().expect("one area");
        assert_eq!((area.id, area.origin, area.orig_id), (20, AreaOrigin::Way, 10));
        assert_eq!(collector.stats().way_areas, 1);
    }

    #[rstest]
    fn assembles_relation_with_hole_when_last_member_arrives(mut locations: LocationHandler) {
        let mut collector = MultipolygonCollector::new(AssemblerConfig { debug_level: 1 });
        let tracked = collector.add_relation(
            relation(
                5,
                &[("type", "multipolygon"), ("natural", "water")],
                &[(20, "outer"), (21, "inner")],
            ),
            |tags| tags.has("natural", "water"),
        );
        assert!(tracked);

        let mut sink = WaterSink::default();
        collector
            .handle_way(&way(20, &[1, 2, 3, 4, 1], &[]), &mut locations, &mut sink)
            .expect("infallible sink");
        assert!(sink.0.is_empty());
        collector
            .handle_way(&way(21, &[5, 6, 7, 8, 5], &[]), &mut locations, &mut sink)
            .expect("infallible sink");

        let area = sink.0.first().expect("relation area");
        assert_eq!((area.id, area.origin), (11, AreaOrigin::Relation));
        assert_eq!(area.tags.get("type"), None);
        assert_eq!(area.geometry.0.len(), 1);
        assert_eq!(
            area.geometry.0.first().map(|polygon| polygon.interiors().len()),
            Some(1)
        );
        assert!(collector.finish(&mut sink).expect("infallible").is_empty());
    }

    #[rstest]
    #[case(&[("type", "route"), ("natural", "water")], false)]
    #[case(&[("type", "boundary"), ("natural", "water")], true)]
    #[case(&[("type", "multipolygon"), ("building", "yes")], true)]
    #[case(&[("type", "multipolygon")], true)]
    fn tracks_every_area_relation(#[case] tags: &[(&str, &str)], #[case] expected: bool) {
        let mut collector = MultipolygonCollector::default();
        let tracked = collector.add_relation(relation(1, tags, &[(20, "outer")]), |tags| {
            tags.has("natural", "water")
        });
        assert_eq!(tracked, expected);
    }

    #[rstest]
    fn old_style_relation_takes_common_outer_tags(mut locations: LocationHandler) {
        let mut collector = MultipolygonCollector::default();
        collector.add_relation(
            relation(8, &[("type", "multipolygon")], &[(30, "outer"), (31, "inner")]),
            |_| false,
        );
        let mut sink = WaterSink::default();
        let outer = way(30, &[1, 2, 3, 4, 1], &[("natural", "water"), ("name", "Old Pond")]);
        let inner = way(31, &[5, 6, 7, 8, 5], &[("natural", "scrub")]);
        for member in [&outer, &inner] {
            collector
                .handle_way(member, &mut locations, &mut sink)
                .expect("infallible sink");
        }
        let [area] = sink.0.as_slice() else {
            panic!("expected only the relation area, got {:?}", sink.0);
        };
        assert_eq!((area.id, area.origin), (17, AreaOrigin::Relation));
        assert_eq!(area.tags.get("name"), Some("Old Pond"));
        assert_eq!(area.tags.get("natural"), Some("water"));
        assert_eq!(collector.stats().way_areas, 0);
    }

    #[rstest]
    #[case::old_style(&[("type", "multipolygon")])]
    #[case::tagged(&[("type", "multipolygon"), ("natural", "water"), ("name", "Lake")])]
    fn tagged_outer_way_yields_only_the_relation_area(
        mut locations: LocationHandler,
        #[case] relation_tags: &[(&str, &str)],
    ) {
        let mut collector = MultipolygonCollector::default();
        collector.add_relation(
            relation(50, relation_tags, &[(10, "outer"), (11, "inner")]),
            |tags| tags.has("natural", "water"),
        );
        let mut sink = WaterSink::default();
        let outer = way(10, &[1, 2, 3, 4, 1], &[("natural", "water"), ("name", "Lake")]);
        let inner = way(11, &[5, 6, 7, 8, 5], &[]);
        for member in [&outer, &inner] {
            collector
                .handle_way(member, &mut locations, &mut sink)
                .expect("infallible sink");
        }
        assert!(collector.finish(&mut sink).expect("infallible").is_empty());

        let ids: Vec<(i64, AreaOrigin)> = sink.0.iter().map(|area| (area.id, area.origin)).collect();
        assert_eq!(ids, vec![(101, AreaOrigin::Relation)]);
    }

    #[rstest]
    fn inner_way_with_its_own_tags_becomes_a_separate_area(mut locations: LocationHandler) {
        let mut collector = MultipolygonCollector::default();
        collector.add_relation(
            relation(
                60,
                &[("type", "multipolygon"), ("landuse", "forest")],
                &[(20, "outer"), (21, "inner")],
            ),
            |tags| tags.has("natural", "water"),
        );
        let mut sink = WaterSink::default();
        let outer = way(20, &[1, 2, 3, 4, 1], &[]);
        let pond = way(21, &[5, 6, 7, 8, 5], &[("natural", "water")]);
        for member in [&outer, &pond] {
            collector
                .handle_way(member, &mut locations, &mut sink)
                .expect("infallible sink");
        }

        let [area] = sink.0.as_slice() else {
            panic!("expected only the pond, got {:?}", sink.0);
        };
        assert_eq!((area.id, area.origin, area.orig_id), (42, AreaOrigin::Way, 21));
        assert_eq!(collector.stats().relation_areas, 0);
    }

    #[rstest]
    fn unwanted_incomplete_relations_are_reported(mut locations: LocationHandler) {
        let mut collector = MultipolygonCollector::default();
        let water = |tags: &TagSet| tags.has("natural", "water");
        collector.add_relation(
            relation(
                77,
                &[("type", "multipolygon"), ("landuse", "forest")],
                &[(70, "outer"), (71, "outer")],
            ),
            water,
        );
        collector.add_relation(
            relation(5, &[("type", "multipolygon"), ("natural", "water")], &[(20, "outer")]),
            water,
        );

        let mut sink = WaterSink::default();
        for member in [way(70, &[1, 2, 3, 4, 1], &[]), way(20, &[5, 6, 7, 8, 5], &[])] {
            collector
                .handle_way(&member, &mut locations, &mut sink)
                .expect("infallible sink");
        }
        let incomplete = collector.finish(&mut sink).expect("infallible sink");

        assert_eq!(incomplete, vec![77]);
        let ids: Vec<i64> = sink.0.iter().map(|area| area.orig_id).collect();
        assert_eq!(ids, vec![5]);
        assert_eq!(collector.stats().relations_tracked, 2);
    }

    #[rstest]
    fn reports_incomplete_relations_in_input_order(mut locations: LocationHandler) {
        let mut collector = MultipolygonCollector::default();
        let water = [("type", "multipolygon"), ("natural", "water")];
        collector.add_relation(relation(9, &water, &[(40, "outer"), (99, "outer")]), |_| true);
        collector.add_relation(relation(3, &water, &[(98, "outer")]), |_| true);
        collector.add_relation(relation(4, &water, &[(41, "outer")]), |_| true);

        let mut areas: Vec<AssembledArea> = Vec::new();
        for member in [way(40, &[1, 2, 3, 4, 1], &[]), way(41, &[5, 6, 7, 8, 5], &[])] {
            collector
                .handle_way(&member, &mut locations, &mut areas)
                .expect("infallible sink");
        }
        let incomplete = collector.finish(&mut areas).expect("infallible sink");

        assert_eq!(incomplete, vec![9, 3]);
        // Relation 4 completed; relation 9 was assembled from the way it had.
        let ids: Vec<i64> = areas
            .iter()
            .filter(|area| area.origin == AreaOrigin::Relation)
            .map(|area| area.orig_id)
            .collect();
        assert_eq!(ids, vec![4, 9]);
        assert_eq!(collector.stats().relations_incomplete, 2);
    }

    #[rstest]
    fn unresolved_nodes_fail_only_that_area(mut locations: LocationHandler) {
        let mut collector = MultipolygonCollector::default();
        let mut areas: Vec<AssembledArea> = Vec::new();
        let broken = way(50, &[1, 2, 3, 404, 1], &[("natural", "water")]);
        collector
            .handle_way(&broken, &mut locations, &mut areas)
            .expect("infallible sink");
        assert!(areas.is_empty());
        assert_eq!(collector.stats().failures, 1);
    }
}
