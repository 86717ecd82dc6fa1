//! OSM XML decoding through `roxmltree`.
//!
//! The whole document is parsed in memory, so this path suits extracts and
//! test fixtures rather than planet files.

use std::io::Read;
use std::ops::ControlFlow;
use std::str::FromStr;

use camino::Utf8Path;
use roxmltree::{Document, Node};
use waterareas_core::TagSet;

use super::{ElementScope, Member, MemberKind, OsmElement, ReadError, Relation, Way};

pub(super) fn read<F>(path: &Utf8Path, scope: ElementScope, mut visit: F) -> Result<(), ReadError>
where
    F: FnMut(OsmElement) -> ControlFlow<()>,
{
    let open_error = |source| ReadError::Open {
        path: path.to_path_buf(),
        source,
    };
    let mut text = String::new();
    waterareas_fs::open_file(path)
        .and_then(|mut file| file.read_to_string(&mut text))
        .map_err(open_error)?;
    let document = Document::parse(&text).map_err(|source| ReadError::Xml {
        source,
        path: path.to_path_buf(),
    })?;

    let parser = XmlParser { path };
    for node in document.root_element().children().filter(Node::is_element) {
        let element = match node.tag_name().name() {
            "node" if scope.wants_nodes_and_ways() => parser.node(node)?,
            "way" if scope.wants_nodes_and_ways() => parser.way(node)?,
            "relation" => parser.relation(node)?,
            _ => continue,
        };
        if visit(element).is_break() {
            break;
        }
    }
    Ok(())
}

struct XmlParser<'p> {
    path: &'p Utf8Path,
}

impl XmlParser<'_> {
    fn node(&self, node: Node<'_, '_>) -> Result<OsmElement, ReadError> {
        Ok(OsmElement::Node {
            id: self.attribute(node, "id")?,
            lon: self.attribute(node, "lon")?,
            lat: self.attribute(node, "lat")?,
        })
    }

    fn way(&self, node: Node<'_, '_>) -> Result<OsmElement, ReadError> {
        let refs = children_named(node, "nd")
            .map(|nd| self.attribute(nd, "ref"))
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(OsmElement::Way(Way {
            id: self.attribute(node, "id")?,
            refs,
            tags: self.tags(node)?,
        }))
    }

    fn relation(&self, node: Node<'_, '_>) -> Result<OsmElement, ReadError> {
        let members = children_named(node, "member")
            .map(|member| self.member(member))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(OsmElement::Relation(Relation {
            id: self.attribute(node, "id")?,
            members,
            tags: self.tags(node)?,
        }))
    }

    fn member(&self, node: Node<'_, '_>) -> Result<Member, ReadError> {
        let kind = match self.text(node, "type")? {
            "node" => MemberKind::Node,
            "way" => MemberKind::Way,
            "relation" => MemberKind::Relation,
            other => return Err(self.malformed(node, format!("unknown member type {other:?}"))),
        };
        Ok(Member {
            kind,
            id: self.attribute(node, "ref")?,
            role: node.attribute("role").unwrap_or_default().to_owned(),
        })
    }

    fn tags(&self, node: Node<'_, '_>) -> Result<TagSet, ReadError> {
        let mut tags = TagSet::new();
        for tag in children_named(node, "tag") {
            tags.push(self.text(tag, "k")?, self.text(tag, "v")?);
        }
        Ok(tags)
    }

    fn text<'a>(&self, node: Node<'a, '_>, name: &str) -> Result<&'a str, ReadError> {
        node.attribute(name)
            .ok_or_else(|| self.malformed(node, format!("missing attribute {name:?}")))
    }

    fn attribute<T: FromStr>(&self, node: Node<'_, '_>, name: &str) -> Result<T, ReadError> {
        let raw = self.text(node, name)?;
        raw.parse()
            .map_err(|_| self.malformed(node, format!("invalid {name} value {raw:?}")))
    }

    fn malformed(&self, node: Node<'_, '_>, detail: String) -> ReadError {
        ReadError::MalformedXml {
            path: self.path.to_path_buf(),
            element: node.tag_name().name().to_owned(),
            detail,
        }
    }
}

fn children_named<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == name)
}
