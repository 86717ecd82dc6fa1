//! Water-body classification and attribute derivation.
//!
//! The rules are evaluated against a single [`TagSet`] and carry no state
//! between areas, so classification is safe to call from anywhere.

use std::fmt;

use crate::TagSet;

/// Water-body type written to the `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaterType {
    /// Artificial lake behind a dam.
    Reservoir,
    /// River area (riverbank polygon or `water=river`).
    River,
    /// Canal area.
    Canal,
    /// Any other standing water.
    Water,
}

impl WaterType {
    /// Label stored in the output layer.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reservoir => "reservoir",
            Self::River => "river",
            Self::Canal => "canal",
            Self::Water => "water",
        }
    }
}

impl fmt::Display for WaterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes derived from the tags of an accepted area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification<'a> {
    /// Water-body type.
    pub water_type: WaterType,
    /// The water body is not permanently filled.
    pub intermittent: bool,
    /// The water is saline.
    pub salt: bool,
    /// The water body is maritime or tidal.
    pub maritime: bool,
    /// Display name, borrowed from the tag set.
    pub name: Option<&'a str>,
}

/// Classify an area by its tags.
///
/// Returns `None` when no water-body rule matches; such areas are never
/// written.
///
/// # Examples
/// ```
/// use waterareas_core::{TagSet, WaterType, classify};
///
/// let tags = TagSet::from_pairs([("natural", "water"), ("water", "river"), ("tidal", "yes")]);
/// let class = classify(&tags).expect("river tags are accepted");
/// assert_eq!(class.water_type, WaterType::River);
/// assert!(class.maritime);
///
/// assert!(classify(&TagSet::from_pairs([("building", "yes")])).is_none());
/// ```
#[must_use]
pub fn classify(tags: &TagSet) -> Option<Classification<'_>> {
    let water_type = water_type(tags)?;
    Some(Classification {
        water_type,
        intermittent: intermittent(tags),
        salt: tags.flag("salt").unwrap_or(false),
        maritime: tags.flag("maritime").unwrap_or(false) || tags.flag("tidal").unwrap_or(false),
        name: display_name(tags),
    })
}

/// Return true when [`classify`] would accept `tags`.
#[must_use]
pub fn is_water_area(tags: &TagSet) -> bool {
    water_type(tags).is_some()
}

/// Decide the water-body type; the first matching rule wins.
///
/// `water=*` refinements of `natural=water` take precedence over the legacy
/// `waterway=riverbank`, `waterway=dock` and `landuse=reservoir` taggings.
#[must_use]
pub fn water_type(tags: &TagSet) -> Option<WaterType> {
    let natural_water = tags.has("natural", "water");
    let water = tags.get("water");

    if natural_water {
        match water {
            Some("reservoir") => return Some(WaterType::Reservoir),
            Some("river") => return Some(WaterType::River),
            Some("canal") => return Some(WaterType::Canal),
            _ => {}
        }
    }

    match tags.get("waterway") {
        Some("riverbank") => return Some(WaterType::River),
        Some("dock") => return Some(WaterType::Water),
        _ => {}
    }

    if tags.has("landuse", "reservoir") {
        return Some(WaterType::Reservoir);
    }

    natural_water.then_some(WaterType::Water)
}

/// First present of `int_name`, `name:en` and `name`.
#[must_use]
pub fn display_name(tags: &TagSet) -> Option<&str> {
    ["int_name", "name:en", "name"]
        .into_iter()
        .find_map(|key| tags.get(key))
}

// An explicit `intermittent` tag decides on its own; `water=intermittent` is
// only consulted when the tag is absent.
fn intermittent(tags: &TagSet) -> bool {
    tags.flag("intermittent")
        .unwrap_or_else(|| tags.has("water", "intermittent"))
}
