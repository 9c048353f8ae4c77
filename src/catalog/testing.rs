use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use crate::catalog::error::FetchError;
use crate::catalog::parse::parse_feed;
use crate::catalog::{CatalogSource, ElementSet, GroupCategory, ObjectGroup};

/// Epoch shared by every fixture record.
pub fn fixture_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 7, 12, 21, 16, 1).unwrap()
}

/// An ISS-like OMM record with the given identity and mean anomaly.
pub fn omm_record(catalog_id: u32, name: &str, mean_anomaly: f64) -> Value {
    json!({
        "OBJECT_NAME": name,
        "OBJECT_ID": "1998-067A",
        "EPOCH": "2020-07-12T21:16:01.000416",
        "MEAN_MOTION": 15.49507896,
        "ECCENTRICITY": 0.0001413,
        "INCLINATION": 51.6461,
        "RA_OF_ASC_NODE": 221.2784,
        "ARG_OF_PERICENTER": 89.1723,
        "MEAN_ANOMALY": mean_anomaly,
        "EPHEMERIS_TYPE": 0,
        "CLASSIFICATION_TYPE": "U",
        "NORAD_CAT_ID": catalog_id,
        "ELEMENT_SET_NO": 999,
        "REV_AT_EPOCH": 23600,
        "BSTAR": -0.000031515,
        "MEAN_MOTION_DOT": -0.00002218,
        "MEAN_MOTION_DDOT": 0.0
    })
}

pub fn feed_body(ids: &[u32], prefix: &str) -> String {
    let records: Vec<Value> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| omm_record(*id, &format!("{} {}", prefix, id), (i as f64 * 37.0) % 360.0))
        .collect();
    serde_json::to_string(&records).unwrap()
}

pub fn element_sets(ids: &[u32], prefix: &str) -> Vec<ElementSet> {
    parse_feed(&feed_body(ids, prefix)).unwrap()
}

pub fn group(id: &str, category: GroupCategory, enabled: bool) -> ObjectGroup {
    ObjectGroup {
        id: id.to_string(),
        label: id.to_uppercase(),
        category,
        color: None,
        source: format!("memory://{}", id),
        enabled,
    }
}

/// In-memory feeds keyed by group id. A group without a feed fails to fetch.
#[derive(Default)]
pub struct StaticSource {
    feeds: Mutex<HashMap<String, String>>,
    fetches: AtomicUsize,
}

impl StaticSource {
    pub fn with_feed(self, group_id: &str, body: String) -> Self {
        self.set_feed(group_id, Some(body));
        self
    }

    pub fn set_feed(&self, group_id: &str, body: Option<String>) {
        let mut feeds = self.feeds.lock().unwrap();
        match body {
            Some(body) => feeds.insert(group_id.to_string(), body),
            None => feeds.remove(group_id),
        };
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl CatalogSource for StaticSource {
    async fn fetch(&self, group: &ObjectGroup) -> Result<Vec<ElementSet>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let body = self.feeds.lock().unwrap().get(&group.id).cloned();
        match body {
            Some(body) => parse_feed(&body),
            None => Err(FetchError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "feed offline",
            ))),
        }
    }
}
