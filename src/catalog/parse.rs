use std::collections::HashMap;

use sgp4::Elements;

use crate::catalog::element_set::ElementSet;
use crate::catalog::error::FetchError;

/// Parse a feed body, either OMM JSON or TLE text.
///
/// Records that fail to decode are dropped individually. A body that had
/// records but none usable is an error, so the caller keeps its previous data.
pub fn parse_feed(content: &str) -> Result<Vec<ElementSet>, FetchError> {
    let content = content.trim();
    if content.is_empty() {
        return Ok(Vec::new());
    }

    let (sets, seen) = if content.starts_with('[') || content.starts_with('{') {
        parse_omm_json(content)?
    } else {
        parse_tle_text(content)
    };

    if seen > 0 && sets.is_empty() {
        return Err(FetchError::NoRecords(seen));
    }
    if sets.len() < seen {
        log::debug!("Dropped {} of {} feed records", seen - sets.len(), seen);
    }

    Ok(keep_newest(sets))
}

fn parse_omm_json(content: &str) -> Result<(Vec<ElementSet>, usize), FetchError> {
    let records: Vec<serde_json::Value> = serde_json::from_str(content)?;
    let seen = records.len();

    let sets = records
        .into_iter()
        .filter_map(|record| {
            let elements: Elements = match serde_json::from_value(record) {
                Ok(e) => e,
                Err(e) => {
                    log::debug!("Skipping malformed OMM record: {}", e);
                    return None;
                }
            };
            build(elements)
        })
        .collect();

    Ok((sets, seen))
}

fn parse_tle_text(content: &str) -> (Vec<ElementSet>, usize) {
    let entries = parse_multi_tle(content);
    let seen = entries.len();

    let sets = entries
        .into_iter()
        .filter_map(|(name, line1, line2)| {
            match Elements::from_tle(name, line1.as_bytes(), line2.as_bytes()) {
                Ok(elements) => build(elements),
                Err(e) => {
                    log::debug!("Skipping malformed TLE: {}", e);
                    None
                }
            }
        })
        .collect();

    (sets, seen)
}

fn build(elements: Elements) -> Option<ElementSet> {
    let norad_id = elements.norad_id;
    ElementSet::from_elements(elements)
        .map_err(|e| log::debug!("Skipping NORAD {}: {}", norad_id, e))
        .ok()
}

/// Collapse repeated catalog ids, keeping the newest epoch in first-seen order.
fn keep_newest(sets: Vec<ElementSet>) -> Vec<ElementSet> {
    let mut index: HashMap<u32, usize> = HashMap::with_capacity(sets.len());
    let mut result: Vec<ElementSet> = Vec::with_capacity(sets.len());

    for set in sets {
        match index.get(&set.catalog_id) {
            Some(&i) => {
                if set.elements.datetime > result[i].elements.datetime {
                    result[i] = set;
                }
            }
            None => {
                index.insert(set.catalog_id, result.len());
                result.push(set);
            }
        }
    }

    result
}

/// Split multi-satellite TLE content into (name, line1, line2) triples.
fn parse_multi_tle(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            result.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            result.push((
                Some(lines[i].to_string()),
                lines[i + 1].to_string(),
                lines[i + 2].to_string(),
            ));
            i += 3;
        } else {
            i += 1;
        }
    }

    result
}
