//! Last-known-good endpoint recovery for failing sites.

use crate::model::History;

/// Find the URL most recently flagged as the site's best endpoint.
///
/// For each URL, the newest record with `is_best` set is taken; the URL whose
/// record is latest wins. Ties keep the URL that appears first in the
/// history. Records with unreadable timestamps rank below any readable one.
pub fn find_last_successful_url<'a>(history: &'a History, site: &str) -> Option<&'a str> {
    let site_history = history.site(site)?;
    let mut best = None;

    for entry in site_history.iter() {
        let Some(record) = entry.records.iter().rev().find(|r| r.is_best) else {
            continue;
        };
        let time = record.time();

        match best {
            Some((_, best_time)) if time <= best_time => {}
            _ => best = Some((entry.url.as_str(), time)),
        }
    }

    best.map(|(url, _)| url)
}
