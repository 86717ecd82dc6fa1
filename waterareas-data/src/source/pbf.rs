//! OSM PBF decoding through `osmpbf`.

use std::ops::ControlFlow;

use camino::Utf8Path;
use osmpbf::{Element, ElementReader, RelMemberType};
use waterareas_core::TagSet;

use super::{ElementScope, Member, MemberKind, OsmElement, ReadError, Relation, Way};

pub(super) fn read<F>(path: &Utf8Path, scope: ElementScope, mut visit: F) -> Result<(), ReadError>
where
    F: FnMut(OsmElement) -> ControlFlow<()>,
{
    let reader = ElementReader::from_path(path).map_err(|source| ReadError::Pbf {
        source,
        path: path.to_path_buf(),
    })?;

    let mut stopped = false;
    reader
        .for_each(|element| {
            if stopped {
                return;
            }
            if let Some(decoded) = convert(element, scope) {
                stopped = visit(decoded).is_break();
            }
        })
        .map_err(|source| ReadError::Pbf {
            source,
            path: path.to_path_buf(),
        })
}

fn convert(element: Element<'_>, scope: ElementScope) -> Option<OsmElement> {
    match element {
        Element::Node(node) if scope.wants_nodes_and_ways() => Some(OsmElement::Node {
            id: node.id(),
            lon: node.lon(),
            lat: node.lat(),
        }),
        Element::DenseNode(node) if scope.wants_nodes_and_ways() => Some(OsmElement::Node {
            id: node.id(),
            lon: node.lon(),
            lat: node.lat(),
        }),
        Element::Way(way) if scope.wants_nodes_and_ways() => Some(OsmElement::Way(Way {
            id: way.id(),
            refs: way.refs().collect(),
            tags: way.tags().collect(),
        })),
        Element::Relation(relation) => {
            let members = relation
                .members()
                .map(|member| Member {
                    kind: match member.member_type {
                        RelMemberType::Node => MemberKind::Node,
                        RelMemberType::Way => MemberKind::Way,
                        RelMemberType::Relation => MemberKind::Relation,
                    },
                    id: member.member_id,
                    role: member.role().map(str::to_owned).unwrap_or_default(),
                })
                .collect();
            let tags: TagSet = relation.tags().collect();
            Some(OsmElement::Relation(Relation {
                id: relation.id(),
                members,
                tags,
            }))
        }
        Element::Node(_) | Element::DenseNode(_) | Element::Way(_) => None,
    }
}
