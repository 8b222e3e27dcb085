//! Field mapping tables - canonical property names to rollup columns.
//!
//! Pure, static data. Event scope and session scope are disjoint
//! namespaces: the same logical concept may have a different canonical
//! key per scope, and a key supported in one scope is unsupported in
//! the other.

use std::collections::HashMap;
use std::sync::LazyLock;

// =============================================================================
// Table and column names
// =============================================================================

/// The raw append-only event log.
pub const RAW_EVENTS_TABLE: &str = "events";

/// The pre-aggregated rollup table referenced by rewritten queries.
pub const ROLLUP_TABLE: &str = "web_bucketed_stats";

/// Hour-aligned time bucket column of the rollup table.
pub const BUCKET_COLUMN: &str = "period_bucket";

/// Canonical pageview event name.
pub const PAGEVIEW_EVENT: &str = "$pageview";

/// Partial aggregate state columns and their merge functions.
pub const PAGEVIEWS_STATE_COLUMN: &str = "pageviews_count_state";
pub const PERSONS_STATE_COLUMN: &str = "persons_uniq_state";
pub const SESSIONS_STATE_COLUMN: &str = "sessions_uniq_state";
pub const SUM_MERGE: &str = "sumMerge";
pub const UNIQ_MERGE: &str = "uniqMerge";

/// Tenant identity column, valid in every scope.
pub const TEAM_ID_COLUMN: &str = "team_id";

// =============================================================================
// Event-scoped properties
// =============================================================================

/// Base identity and attribute properties captured per event.
const BASE_PROPERTY_COLUMNS: &[(&str, &str)] = &[
    ("$browser", "browser"),
    ("$os", "os"),
    ("$device_type", "device_type"),
    ("$viewport_width", "viewport_width"),
    ("$viewport_height", "viewport_height"),
    ("$geoip_country_code", "country_code"),
    ("$geoip_subdivision_1_code", "region_code"),
    ("$geoip_city_name", "city_name"),
    ("$referring_domain", "referring_domain"),
    ("utm_source", "utm_source"),
    ("utm_medium", "utm_medium"),
    ("utm_campaign", "utm_campaign"),
    ("utm_term", "utm_term"),
    ("utm_content", "utm_content"),
];

/// Ad-platform attribution and click-id parameters.
const CLICK_ID_PROPERTY_COLUMNS: &[(&str, &str)] = &[
    ("gclid", "gclid"),
    ("gad_source", "gad_source"),
    ("gclsrc", "gclsrc"),
    ("dclid", "dclid"),
    ("gbraid", "gbraid"),
    ("wbraid", "wbraid"),
    ("fbclid", "fbclid"),
    ("msclkid", "msclkid"),
    ("twclid", "twclid"),
    ("li_fat_id", "li_fat_id"),
    ("mc_cid", "mc_cid"),
    ("igshid", "igshid"),
    ("ttclid", "ttclid"),
    ("_kx", "_kx"),
    ("irclid", "irclid"),
];

/// Page path properties.
const PATH_PROPERTY_COLUMNS: &[(&str, &str)] = &[("$pathname", "pathname")];

/// Extra columns carried only by this rollup table.
const EVENT_EXTRA_COLUMNS: &[(&str, &str)] = &[("$host", "host")];

// =============================================================================
// Session-scoped properties
// =============================================================================

const SESSION_PROPERTY_COLUMNS: &[(&str, &str)] = &[
    ("$entry_pathname", "entry_pathname"),
    ("$end_pathname", "end_pathname"),
    ("$entry_referring_domain", "entry_referring_domain"),
    ("$entry_utm_source", "entry_utm_source"),
    ("$entry_utm_medium", "entry_utm_medium"),
    ("$entry_utm_campaign", "entry_utm_campaign"),
    ("$entry_utm_term", "entry_utm_term"),
    ("$entry_utm_content", "entry_utm_content"),
    ("$channel_type", "channel_type"),
];

// =============================================================================
// Lookup tables
// =============================================================================

static EVENT_PROPERTIES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    BASE_PROPERTY_COLUMNS
        .iter()
        .chain(CLICK_ID_PROPERTY_COLUMNS)
        .chain(PATH_PROPERTY_COLUMNS)
        .chain(EVENT_EXTRA_COLUMNS)
        .copied()
        .collect()
});

static SESSION_PROPERTIES: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| SESSION_PROPERTY_COLUMNS.iter().copied().collect());

/// Rollup column for an event-scoped property key.
pub fn event_property_column(key: &str) -> Option<&'static str> {
    EVENT_PROPERTIES.get(key).copied()
}

/// Rollup column for a session-scoped property key.
pub fn session_property_column(key: &str) -> Option<&'static str> {
    SESSION_PROPERTIES.get(key).copied()
}

/// All supported event-scoped property keys.
pub fn event_property_keys() -> impl Iterator<Item = &'static str> {
    EVENT_PROPERTIES.keys().copied()
}

/// All supported session-scoped property keys.
pub fn session_property_keys() -> impl Iterator<Item = &'static str> {
    SESSION_PROPERTIES.keys().copied()
}

// =============================================================================
// Chain resolution
// =============================================================================

/// Resolve a field-access chain to its rollup column.
///
/// Recognized spellings, after stripping a leading qualifier naming one of
/// `tables`:
/// - `team_id`
/// - `properties.<key>` / `properties.metadata.<key>` (event scope)
/// - `session.<key>` / `session.metadata.<key>` (session scope)
///
/// The prefix determines the scope; a key valid in the other scope only
/// resolves to `None`.
pub fn column_for_chain(chain: &[String], tables: &[String]) -> Option<&'static str> {
    let rest = strip_table_qualifier(chain, tables);

    if rest.len() == 1 && rest[0] == TEAM_ID_COLUMN {
        return Some(TEAM_ID_COLUMN);
    }

    let (scope_prefix, key) = match rest {
        [prefix, key] => (prefix.as_str(), key.as_str()),
        [prefix, meta, key] if meta == "metadata" => (prefix.as_str(), key.as_str()),
        _ => return None,
    };

    match scope_prefix {
        "properties" => event_property_column(key),
        "session" => session_property_column(key),
        _ => None,
    }
}

/// Strip a leading table qualifier when the first segment names one of
/// `tables` and more segments follow.
pub fn strip_table_qualifier<'a>(chain: &'a [String], tables: &[String]) -> &'a [String] {
    match chain.first() {
        Some(head) if chain.len() > 1 && tables.iter().any(|t| t == head) => &chain[1..],
        _ => chain,
    }
}
