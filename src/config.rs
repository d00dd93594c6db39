// =============================================================================
// config.rs — THE GRAND CONFIGURATION CATHEDRAL
// =============================================================================
//
// Every system needs configuration, but not every system needs THIS MUCH
// configuration for fetching one JSON file. We have knobs for a fetch that
// happens exactly once per session, and tunables for an aggregation whose
// magic numbers (five recent trips, three top destinations) come from the
// dashboard design and will probably never change.
//
// All values can be overridden via environment variables, because hardcoding
// configuration is how you end up on the front page of Hacker News for the
// wrong reasons.
// =============================================================================

use std::env;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// The fallback trips endpoint. A static JSON file on GitHub Pages.
/// No query parameters, no pagination, no auth. A simpler time.
pub const DEFAULT_TRIPS_URL: &str =
    "https://rapidtechinsights.github.io/hr-assignment/recent.json";

/// The Grand Configuration Struct. Every tunable parameter in the entire
/// engine lives here. Think of it as the cockpit of a fighter jet, except
/// instead of controlling weapons systems, you're controlling how many
/// destinations show up in a pie chart.
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // DATA SOURCE
    // =========================================================================

    /// The trips endpoint. Fetched once per session activation; a failed
    /// fetch leaves the dataset empty indefinitely. No retry. We said what
    /// we said.
    pub trips_url: Url,

    /// How long we're willing to wait for that one fetch before declaring
    /// transport failure. Default: 20 seconds, same patience we'd extend
    /// to any static file host having a day.
    pub http_timeout: Duration,

    /// The User-Agent we announce ourselves with. We identify clearly,
    /// because fetching anonymously is for scrapers and we have manners.
    pub http_user_agent: String,

    // =========================================================================
    // AGGREGATION
    // The dashboard numbers. Five recent trips. Three top destinations.
    // Carved in stone by the design mockup, adjustable by env var anyway.
    // =========================================================================

    /// How many of the most recent trips the aggregation surfaces.
    pub recent_trips_count: usize,

    /// How many top dropoff locations the aggregation surfaces.
    pub top_destinations_count: usize,

    // =========================================================================
    // SNAPSHOT DEDUPER PARAMETERS
    // For when "probably unique" needs to become "definitely unique."
    // =========================================================================

    /// Expected number of trip identifiers per payload. Default: 10_000,
    /// which is optimistic by roughly two orders of magnitude.
    pub bloom_expected_items: u64,

    /// Target Bloom false positive rate. 0.01 = 1% chance the LRU backstop
    /// has to earn its keep.
    pub bloom_false_positive_rate: f64,

    /// Maximum identifiers held by the LRU backstop.
    pub lru_cache_size: usize,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    /// "Sensible" here meaning "will work out of the box without any env vars
    /// but will also respect your wishes if you set them."
    ///
    /// Every parameter can be overridden via environment variables prefixed
    /// with ROAMIFY_. Because namespacing your env vars is what separates
    /// the professionals from the amateurs.
    pub fn from_env() -> Self {
        // Try to load .env if it exists. Fail silently if it doesn't,
        // because not everyone has their life together enough to create
        // a .env file.
        let _ = dotenvy::dotenv();

        let trips_url_raw = env_or_default("ROAMIFY_TRIPS_URL", DEFAULT_TRIPS_URL);
        let trips_url = match Url::parse(&trips_url_raw) {
            Ok(url) => url,
            Err(e) => {
                warn!(
                    url = trips_url_raw.as_str(),
                    error = %e,
                    "ROAMIFY_TRIPS_URL does not parse — falling back to the default endpoint"
                );
                Url::parse(DEFAULT_TRIPS_URL)
                    .expect("the default trips URL is a compile-time constant and it parses")
            }
        };

        Config {
            trips_url,
            http_timeout: Duration::from_secs(
                env_or_default("ROAMIFY_HTTP_TIMEOUT_SECS", "20").parse().unwrap_or(20),
            ),
            http_user_agent: env_or_default(
                "ROAMIFY_HTTP_USER_AGENT",
                "RoamifyTripEngine/1.0 (dashboard-core)",
            ),

            recent_trips_count: env_or_default("ROAMIFY_RECENT_TRIPS", "5")
                .parse()
                .unwrap_or(5),
            top_destinations_count: env_or_default("ROAMIFY_TOP_DESTINATIONS", "3")
                .parse()
                .unwrap_or(3),

            bloom_expected_items: env_or_default("ROAMIFY_BLOOM_ITEMS", "10000")
                .parse()
                .unwrap_or(10_000),
            bloom_false_positive_rate: env_or_default("ROAMIFY_BLOOM_FP_RATE", "0.01")
                .parse()
                .unwrap_or(0.01),
            lru_cache_size: env_or_default("ROAMIFY_LRU_CACHE_SIZE", "10000")
                .parse()
                .unwrap_or(10_000),
        }
    }
}

/// Helper function to read an environment variable with a default fallback.
/// Because unwrap_or on env::var is ugly and we have standards.
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint_parses() {
        assert!(Url::parse(DEFAULT_TRIPS_URL).is_ok());
    }

    #[test]
    fn test_env_or_default_falls_back() {
        assert_eq!(
            env_or_default("ROAMIFY_TEST_KEY_THAT_DOES_NOT_EXIST", "fallback"),
            "fallback"
        );
    }
}
