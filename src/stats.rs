//! Squadron statistics decoding
//!
//! The profile header carries a `squadrons-stat` container with several
//! `squadrons-stat__item` lists side by side. Values in the chosen list are
//! matched by position against [`StatLabel::ALL`].

use crate::roster::{cell_text, selector};
use scraper::Html;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::warn;

const STAT_CONTAINER: &str = "div.squadrons-profile__header-stat.squadrons-stat";
const STAT_GROUP: &str = "ul.squadrons-stat__item";
const STAT_VALUE: &str = "li.squadrons-stat__item-value";
const LABEL_MODIFIER: &str = "squadrons-stat__item-value--label";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatLabel {
    AirTargets,
    GroundTargets,
    Deaths,
    FlightTime,
}

impl StatLabel {
    /// Order in which values appear in a stat group
    pub const ALL: [StatLabel; 4] = [
        StatLabel::AirTargets,
        StatLabel::GroundTargets,
        StatLabel::Deaths,
        StatLabel::FlightTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatLabel::AirTargets => "Air targets destroyed",
            StatLabel::GroundTargets => "Ground targets destroyed",
            StatLabel::Deaths => "Deaths",
            StatLabel::FlightTime => "Flight Time",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Int(u64),
    Float(f64),
    Text(String),
}

/// Type a stat value: `None` for blank or "N/A", then integer (thousands
/// separators removed), then finite float, else the trimmed text unchanged.
/// Digit runs too large for `u64` stay text so no digits are lost.
pub fn coerce(text: &str) -> Option<StatValue> {
    let s = text.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("N/A") {
        return None;
    }

    let clean = s.replace(',', "");
    if !clean.is_empty() && clean.bytes().all(|b| b.is_ascii_digit()) {
        return Some(match clean.parse::<u64>() {
            Ok(n) => StatValue::Int(n),
            Err(_) => StatValue::Text(s.to_string()),
        });
    }

    match clean.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(StatValue::Float(f)),
        _ => Some(StatValue::Text(s.to_string())),
    }
}

/// Labelled stat values in label order. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatBlock {
    entries: Vec<(StatLabel, Option<StatValue>)>,
}

impl StatBlock {
    /// Pair labels with values up to the shorter of the two.
    fn from_values(values: impl IntoIterator<Item = Option<StatValue>>) -> Self {
        Self {
            entries: StatLabel::ALL.into_iter().zip(values).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `None` if the label was not decoded, `Some(None)` if it was absent on the page.
    pub fn get(&self, label: StatLabel) -> Option<&Option<StatValue>> {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatLabel, Option<&StatValue>)> {
        self.entries.iter().map(|(l, v)| (*l, v.as_ref()))
    }
}

impl Serialize for StatBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, value) in &self.entries {
            map.serialize_entry(label.as_str(), value)?;
        }
        map.end()
    }
}

/// Decode stat group `group` (0-based) from a squadron page.
///
/// A missing container, no groups, or a negative or out-of-range index all
/// give an empty block.
pub fn decode_stats(markup: &str, group: i64) -> StatBlock {
    let doc = Html::parse_document(markup);

    let (Some(container_sel), Some(group_sel), Some(value_sel)) = (
        selector(STAT_CONTAINER),
        selector(STAT_GROUP),
        selector(STAT_VALUE),
    ) else {
        return StatBlock::default();
    };

    let Some(container) = doc.select(&container_sel).next() else {
        warn!("no stat container found");
        return StatBlock::default();
    };

    let groups: Vec<_> = container.select(&group_sel).collect();
    let Some(selected) = usize::try_from(group).ok().and_then(|i| groups.get(i)) else {
        warn!(group, groups = groups.len(), "stat group not found");
        return StatBlock::default();
    };

    let values = selected
        .select(&value_sel)
        .filter(|li| !li.value().classes().any(|c| c == LABEL_MODIFIER))
        .map(|li| coerce(&cell_text(li)));

    StatBlock::from_values(values)
}
