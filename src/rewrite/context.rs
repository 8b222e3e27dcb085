//! Per-invocation and per-select rewrite state.

use std::collections::HashSet;

use crate::mapping::RAW_EVENTS_TABLE;

// =============================================================================
// Settings (per invocation)
// =============================================================================

/// Tenant context seeded by the caller for one engine invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteSettings {
    /// Feature toggle. When off, the engine returns its input unchanged.
    pub enabled: bool,
    /// The tenant's configured time zone identifier, if any.
    pub timezone: Option<String>,
}

impl RewriteSettings {
    pub fn new(timezone: &str) -> Self {
        Self {
            enabled: true,
            timezone: Some(timezone.into()),
        }
    }

    /// Settings with no configured time zone.
    pub fn without_timezone() -> Self {
        Self {
            enabled: true,
            timezone: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

// =============================================================================
// Scope (per select block)
// =============================================================================

/// Accumulator threaded through the rewrite of one select block.
///
/// Each select gets a fresh scope, so one sub-query's aliases or
/// aggregates never leak into a sibling.
#[derive(Debug, Clone, Default)]
pub struct RewriteScope {
    /// Names that qualify a field chain: the raw table plus the select's
    /// source alias, if any.
    tables: Vec<String>,
    /// Aliases introduced earlier in this select's own SELECT list.
    local_aliases: HashSet<String>,
    /// Set once any aggregate call is substituted; a select with no
    /// recognized aggregate is not a rewrite candidate.
    rewrote_aggregate: bool,
}

impl RewriteScope {
    /// Scope for a select over the raw event table, optionally aliased.
    pub fn new(source_alias: Option<&str>) -> Self {
        let mut tables = vec![RAW_EVENTS_TABLE.to_string()];
        if let Some(alias) = source_alias {
            if alias != RAW_EVENTS_TABLE {
                tables.push(alias.to_string());
            }
        }
        Self {
            tables,
            local_aliases: HashSet::new(),
            rewrote_aggregate: false,
        }
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn record_alias(&mut self, name: &str) {
        self.local_aliases.insert(name.to_string());
    }

    pub fn is_local_alias(&self, name: &str) -> bool {
        self.local_aliases.contains(name)
    }

    pub fn mark_aggregate_rewrite(&mut self) {
        self.rewrote_aggregate = true;
    }

    pub fn rewrote_aggregate(&self) -> bool {
        self.rewrote_aggregate
    }
}
