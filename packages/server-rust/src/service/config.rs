/// Server-level policy and collection layout for the listing service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Reject submissions for categories that have no listing schema.
    pub schema_required: bool,
    /// Attach internal error details to 500 responses.
    pub debug_diagnostics: bool,
    /// Collection holding category documents.
    pub categories_collection: String,
    /// Collection holding listing schema documents, keyed by category id.
    pub schemas_collection: String,
    /// Collection holding listing documents.
    pub listings_collection: String,
    /// Anti-abuse thresholds.
    pub abuse: AbuseConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            schema_required: false,
            debug_diagnostics: false,
            categories_collection: "categories".to_string(),
            schemas_collection: "listingSchemas".to_string(),
            listings_collection: "listings".to_string(),
            abuse: AbuseConfig::default(),
        }
    }
}

/// Thresholds for the listing abuse heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbuseConfig {
    /// More creations than this inside `window_ms` flag the owner.
    pub max_listings_per_window: usize,
    /// Sliding window length in milliseconds.
    pub window_ms: u64,
    /// Flags kept for review; the oldest are dropped past this.
    pub max_flags: usize,
}

impl Default for AbuseConfig {
    fn default() -> Self {
        Self {
            max_listings_per_window: 10,
            window_ms: 60 * 60 * 1000,
            max_flags: 1_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_defaults() {
        let config = ServerConfig::default();
        assert!(!config.schema_required);
        assert!(!config.debug_diagnostics);
        assert_eq!(config.schemas_collection, "listingSchemas");
        assert_eq!(config.listings_collection, "listings");
        assert_eq!(config.abuse.max_listings_per_window, 10);
        assert_eq!(config.abuse.window_ms, 3_600_000);
        assert_eq!(config.abuse.max_flags, 1_000);
    }
}
