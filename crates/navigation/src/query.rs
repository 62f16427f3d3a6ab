//! The navigation query engine: path-indexed slicing of a reference tree
//! for range, depth and membership queries.

use crate::error::NavError;
use crate::path::{PathIndex, get_member_by_path};
use crate::tree::CitableUnit;

/// The answer to a navigation query: retained units (children stripped)
/// plus summaries of the anchors that were supplied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Navigation {
    pub members: Vec<CitableUnit>,
    pub start: Option<CitableUnit>,
    pub end: Option<CitableUnit>,
}

/// The raw query parameters of the navigation endpoint, before `ref` and
/// `start`/`end` are collapsed into the pair `get_nav` takes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NavQuery<'a> {
    pub reference: Option<&'a str>,
    pub start: Option<&'a str>,
    pub end: Option<&'a str>,
    pub down: Option<i64>,
}

impl<'a> NavQuery<'a> {
    /// Validates the parameter combination and collapses it into the
    /// `(start_or_ref, end)` pair. `ref` is exclusive with `start`/`end`;
    /// `start` and `end` come together or not at all.
    pub fn resolve(&self) -> Result<(Option<&'a str>, Option<&'a str>), NavError> {
        if self.reference.is_some() && (self.start.is_some() || self.end.is_some()) {
            return Err(NavError::BadRangeRequest(
                "ref cannot be combined with start or end".to_string(),
            ));
        }
        match (self.start, self.end) {
            (Some(_), None) | (None, Some(_)) => Err(NavError::BadRangeRequest(
                "a range requires both start and end".to_string(),
            )),
            (Some(start), Some(end)) => Ok((Some(start), Some(end))),
            (None, None) => Ok((self.reference, None)),
        }
    }
}

/// Answers a navigation query over a reference tree.
///
/// `down` controls how many levels below the anchors to include:
/// `None` asks for anchor summaries only, `0` for the range slice at the
/// anchors' own level, `-1` for unbounded descent, `n ≥ 1` for `n` further
/// levels. With only `start` set, members are strict descendants of the
/// anchor; the anchor itself is returned separately as `start`.
pub fn get_nav(
    units: &[CitableUnit],
    paths: &PathIndex,
    start_or_ref: Option<&str>,
    end: Option<&str>,
    down: Option<i64>,
) -> Result<Navigation, NavError> {
    let start_entry = lookup(paths, start_or_ref)?;
    let end_entry = lookup(paths, end)?;

    let start_summary = match (start_or_ref, start_entry) {
        (Some(reference), Some((_, path))) => Some(summary(units, reference, path)?),
        _ => None,
    };
    let end_summary = match (end, end_entry) {
        (Some(reference), Some((_, path))) => Some(summary(units, reference, path)?),
        _ => None,
    };

    if let (Some((s, _)), Some((e, _))) = (start_entry, end_entry) {
        if s > e {
            return Err(NavError::InvalidRangeOrder);
        }
    }

    // Projection-only queries: no members, just the anchors.
    let Some(down) = down else {
        if start_entry.is_none() {
            return Err(NavError::BadRangeRequest(
                "the down parameter is required when no ref, start or end is given".to_string(),
            ));
        }
        return Ok(Navigation {
            members: Vec::new(),
            start: start_summary,
            end: end_summary,
        });
    };

    if down < -1 {
        return Err(NavError::BadRangeRequest(format!(
            "down must be -1, 0 or a positive depth, got {}",
            down
        )));
    }
    if down == 0 {
        match (start_entry, end_entry) {
            (Some((_, start_path)), Some((_, end_path))) => {
                if start_path.len() != end_path.len() {
                    return Err(NavError::BadRangeRequest(
                        "down=0 requires start and end at the same level".to_string(),
                    ));
                }
            }
            _ => {
                return Err(NavError::BadRangeRequest(
                    "down=0 requires both start and end".to_string(),
                ));
            }
        }
    }

    if paths.is_empty() {
        return Ok(Navigation::default());
    }

    let start_index = start_entry.map(|(i, _)| i).unwrap_or(0);
    let end_index = resolve_end_index(paths, start_entry, end_entry);

    // The anchors' deeper level; 0 when the query has no anchor.
    let level = start_entry
        .iter()
        .chain(end_entry.iter())
        .map(|(_, path)| path.len())
        .max()
        .unwrap_or(0);

    let anchored_start_only = start_entry.is_some() && end_entry.is_none();

    log::debug!(
        "navigation slice [{}, {}], level {}, down {}",
        start_index,
        end_index,
        level,
        down
    );

    let mut members = Vec::new();
    for i in start_index..=end_index {
        let (reference, path) = paths.entry(i);
        let len = path.len();
        let keep = match down {
            0 => len == level,
            -1 => {
                if anchored_start_only {
                    len > level
                } else {
                    true
                }
            }
            n => {
                let n = n as usize;
                if anchored_start_only {
                    len > level && len <= level + n
                } else {
                    len >= level && len <= level + n
                }
            }
        };
        if keep {
            members.push(summary(units, reference, path)?);
        }
    }

    Ok(Navigation {
        members,
        start: start_summary,
        end: end_summary,
    })
}

fn lookup<'p>(
    paths: &'p PathIndex,
    reference: Option<&str>,
) -> Result<Option<(usize, &'p [usize])>, NavError> {
    match reference {
        None => Ok(None),
        Some(r) => {
            let position = paths
                .position(r)
                .ok_or_else(|| NavError::UnknownRef(r.to_string()))?;
            Ok(Some((position, paths.entry(position).1)))
        }
    }
}

/// The inclusive upper bound of the query slice. A set `end` extends over
/// its whole subtree (every following ref whose path it prefixes); an unset
/// `end` with a set `start` stops just before the next ref at start's level
/// or shallower.
fn resolve_end_index(
    paths: &PathIndex,
    start_entry: Option<(usize, &[usize])>,
    end_entry: Option<(usize, &[usize])>,
) -> usize {
    if let Some((end_position, end_path)) = end_entry {
        let mut index = end_position;
        for i in end_position + 1..paths.len() {
            if paths.entry(i).1.starts_with(end_path) {
                index = i;
            } else {
                break;
            }
        }
        return index;
    }
    if let Some((start_position, start_path)) = start_entry {
        for i in start_position + 1..paths.len() {
            if paths.entry(i).1.len() <= start_path.len() {
                return i - 1;
            }
        }
    }
    paths.len() - 1
}

/// Resolves an index entry to a unit summary. The index and the unit tree
/// are supplied independently, so a mismatch between them is an error, not
/// an invariant.
fn summary(
    units: &[CitableUnit],
    reference: &str,
    path: &[usize],
) -> Result<CitableUnit, NavError> {
    get_member_by_path(units, path)
        .map(CitableUnit::summary)
        .ok_or_else(|| NavError::StaleIndex(reference.to_string()))
}
