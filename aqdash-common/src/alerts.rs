//! Advisory banner: which sensors carry an active alert and how to name them

use serde::Serialize;

use crate::feed::FeedSnapshot;

/// Where the banner's "View issued warnings" link points
pub const WARNINGS_URL: &str = "https://aqwarnings.gov.bc.ca/#issued-warnings";

/// Locations listed in full before the label is truncated
const MAX_LISTED_LOCATIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertLocation {
    pub id: String,
    pub name: Option<String>,
    pub region: Option<String>,
}

/// Banner payload; only produced when at least one alert is active
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertBanner {
    pub label: String,
    pub alert_count: usize,
    pub message: String,
    pub link: &'static str,
}

/// Sensors flagged with an active alert, in feed order
pub fn active_alerts(snapshot: &FeedSnapshot) -> Vec<AlertLocation> {
    snapshot
        .sensors
        .iter()
        .filter(|s| s.active_alert)
        .map(|s| AlertLocation {
            id: s.id.clone(),
            name: s.name.clone(),
            region: s.region.clone(),
        })
        .collect()
}

/// Human label for a set of alerts; `None` for an empty set.
///
/// Distinct regions are preferred, then distinct names, then ids. Up to three
/// locations are joined with ", "; longer lists show the first three joined
/// with "; " followed by " and N more".
pub fn summarize(alerts: &[AlertLocation]) -> Option<String> {
    if alerts.is_empty() {
        return None;
    }

    let mut locations = distinct(alerts.iter().map(|a| a.region.as_deref()));
    if locations.is_empty() {
        locations = distinct(alerts.iter().map(|a| a.name.as_deref()));
    }
    if locations.is_empty() {
        locations = distinct(alerts.iter().map(|a| Some(a.id.as_str())));
    }

    let label = if locations.len() <= MAX_LISTED_LOCATIONS {
        locations.join(", ")
    } else {
        format!(
            "{} and {} more",
            locations[..MAX_LISTED_LOCATIONS].join("; "),
            locations.len() - MAX_LISTED_LOCATIONS
        )
    };

    Some(label)
}

/// Banner for the snapshot, `None` when no alert is active
pub fn alert_banner(snapshot: &FeedSnapshot) -> Option<AlertBanner> {
    let alerts = active_alerts(snapshot);
    let label = summarize(&alerts)?;

    Some(AlertBanner {
        message: format!("Air quality advisory in effect for: {}.", label),
        label,
        alert_count: alerts.len(),
        link: WARNINGS_URL,
    })
}

/// Non-empty values in first-seen order without repeats
fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<&'a str> {
    let mut seen = Vec::new();
    for value in values.flatten() {
        if !value.trim().is_empty() && !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}
