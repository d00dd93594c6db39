// ██████╗  ██████╗  █████╗ ███╗   ███╗██╗███████╗██╗   ██╗
// ██╔══██╗██╔═══██╗██╔══██╗████╗ ████║██║██╔════╝╚██╗ ██╔╝
// ██████╔╝██║   ██║███████║██╔████╔██║██║█████╗   ╚████╔╝
// ██╔══██╗██║   ██║██╔══██║██║╚██╔╝██║██║██╔══╝    ╚██╔╝
// ██║  ██║╚██████╔╝██║  ██║██║ ╚═╝ ██║██║██║        ██║
// ╚═╝  ╚═╝ ╚═════╝ ╚═╝  ╚═╝╚═╝     ╚═╝╚═╝╚═╝        ╚═╝
//
// T R I P   E N G I N E
//
// The most overkill trip dashboard core ever conceived.
// Rust + Tokio + Bloom Filters + SIMD substring search
// All to filter fifty taxi trips when someone presses SEARCH.

mod aggregate;
mod config;
mod dashboard;
mod dedup;
mod error;
mod filter;
mod models;
mod source;
mod stats;

use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::dashboard::{SearchState, TripDashboard};
use crate::source::TripSource;
use crate::stats::EngineStats;

fn print_banner() {
    let banner = r#"

    ╔══════════════════════════════════════════════════════════════════╗
    ║                                                                  ║
    ║   ██████╗  ██████╗  █████╗ ███╗   ███╗██╗███████╗██╗   ██╗       ║
    ║   ██╔══██╗██╔═══██╗██╔══██╗████╗ ████║██║██╔════╝╚██╗ ██╔╝       ║
    ║   ██████╔╝██║   ██║███████║██╔████╔██║██║█████╗   ╚████╔╝        ║
    ║   ██╔══██╗██║   ██║██╔══██║██║╚██╔╝██║██║██╔══╝    ╚██╔╝         ║
    ║   ██║  ██║╚██████╔╝██║  ██║██║ ╚═╝ ██║██║██║        ██║          ║
    ║   ╚═╝  ╚═╝ ╚═════╝ ╚═╝  ╚═╝╚═╝     ╚═╝╚═╝╚═╝        ╚═╝          ║
    ║                                                                  ║
    ║              ⚡ TRIP DASHBOARD ENGINE ⚡                          ║
    ║                                                                  ║
    ║   Source:   one JSON endpoint, fetched once, trusted never       ║
    ║   Filters:  status | keyword | distance | time                   ║
    ║   Dedup:    Bloom Filter + LRU Cache Hybrid                      ║
    ║   Keyword:  SIMD-Accelerated memmem Substring Scanning           ║
    ║                                                                  ║
    ║   "Four predicates. Zero mercy."                                 ║
    ║                                                                  ║
    ╚══════════════════════════════════════════════════════════════════╝

    "#;
    println!("{}", banner);
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(true)
        .init();

    print_banner();

    info!("🚕 ROAMIFY TRIP ENGINE initializing...");

    // Load configuration
    let config = Arc::new(Config::from_env());
    info!("✅ Configuration loaded: trips_url={}", config.trips_url);

    // Stats collector
    let engine_stats = Arc::new(EngineStats::new());
    info!("✅ Stats collector initialized");

    // The one-shot trip source
    let trip_source = TripSource::new(Arc::clone(&config))?;
    info!("✅ Trip source online");

    // The dashboard itself, then the session's single dataset load
    let mut dashboard = TripDashboard::new(Arc::clone(&config), Arc::clone(&engine_stats));
    dashboard.activate(&trip_source).await;

    // ═══════════════════════════════════════════
    // REPORT WHAT WE LOADED
    // ═══════════════════════════════════════════
    {
        let view = dashboard.view();
        if let Some(load_error) = &view.load_error {
            error!("❌ Dataset load failed: {}", load_error);
            error!("   The dashboard will render an empty state. No retry. Such is life.");
        } else {
            info!("═══════════════════════════════════════════════════════");
            info!("  🟢 DATASET ONLINE — {} trips in memory", view.dataset.len());
            info!("  🕐 Latest trips:");
            for trip in &view.aggregation.recent_trips {
                info!("     {}", trip);
            }
            info!("  📍 Top destinations:");
            for share in &view.aggregation.top_destinations {
                info!("     {}: {:.2}% ({} trips)", share.location, share.percentage, share.count);
            }
            info!("═══════════════════════════════════════════════════════");
        }
    }

    // One identity search, so the session ends with the filtered view
    // populated the way the trips page populates it on first SEARCH.
    dashboard.run_search();
    let view = dashboard.view();
    match view.search {
        SearchState::Results(results) => {
            let note = if view.criteria.is_identity() {
                " (all of them, as an identity filter should)"
            } else {
                ""
            };
            info!(
                "🔎 Search complete — {} of {} trips survive{}",
                results.len(),
                view.dataset.len(),
                note
            );
        }
        SearchState::NotYetSearched => {
            // run_search just executed; this arm is unreachable in practice.
            error!("🔎 Search state missing after a search ran");
        }
    }

    info!(
        "📊 Session stats: {}",
        serde_json::to_string(&view.stats).unwrap_or_else(|_| "{}".to_string())
    );
    info!("🛑 ROAMIFY TRIP ENGINE: session complete");
    Ok(())
}
