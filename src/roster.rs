//! Squadron roster decoding
//!
//! The members table is a flat grid: every player occupies six consecutive
//! `squadrons-members__grid-item` cells (index, name, rating, activity, role,
//! join date). The grid is cut into rows of six and each row mapped by offset.

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

const ROSTER_TABLE: &str = ".squadrons-members__table";
const GRID_ITEM: &str = ".squadrons-members__grid-item";
const ROW_WIDTH: usize = 6;

/// One squadron member. Only built for rows with a numeric rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRecord {
    #[serde(skip)]
    pub name: String,
    pub rating: u64,
    pub activity: Option<u64>,
    pub rank: String,
    #[serde(rename = "joindate")]
    pub join_date: String,
}

/// Players keyed by name; a later row with the same name replaces an earlier one.
pub type Roster = BTreeMap<String, PlayerRecord>;

/// Decode the members table of a squadron page.
///
/// Returns an empty roster when the table is missing. Rows without a numeric
/// rating are skipped, and a trailing partial row is ignored.
pub fn decode_roster(markup: &str) -> Roster {
    let doc = Html::parse_document(markup);
    let mut roster = Roster::new();

    let (Some(table_sel), Some(cell_sel)) = (selector(ROSTER_TABLE), selector(GRID_ITEM)) else {
        return roster;
    };
    let Some(table) = doc.select(&table_sel).next() else {
        warn!("no roster table found");
        return roster;
    };

    let cells: Vec<String> = table.select(&cell_sel).map(cell_text).collect();
    if cells.is_empty() {
        warn!("roster table has no cells");
        return roster;
    }

    for row in cells.chunks_exact(ROW_WIDTH) {
        match decode_row(row) {
            Some(record) => {
                roster.insert(record.name.clone(), record);
            }
            None => debug!(player = %row[1], rating = %row[2], "skipping row without a numeric rating"),
        }
    }

    let leftover = cells.len() % ROW_WIDTH;
    if leftover != 0 {
        debug!(leftover, "ignoring partial trailing row");
    }

    roster
}

fn decode_row(row: &[String]) -> Option<PlayerRecord> {
    let [_, name, rating, activity, rank, joined] = row else {
        return None;
    };

    Some(PlayerRecord {
        name: name.clone(),
        rating: parse_count(rating)?,
        activity: parse_count(activity),
        rank: rank.clone(),
        join_date: joined.clone(),
    })
}

/// Strict non-negative integer: every character must be an ASCII digit.
/// Signs, separators and decimals all give `None`.
pub fn parse_count(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

pub(crate) fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

pub(crate) fn cell_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
