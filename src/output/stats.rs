//! Statistics generation from the crawl database
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::crawler::SessionStats;
use crate::storage::{EntityKind, EntityStore, StoreResult};

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStatistics {
    /// Number of stored player matchlists
    pub matchlists: u64,

    /// Number of stored matches
    pub matches: u64,

    /// Matches in the failure ledger
    pub failed_matches: u64,

    /// Matchlists per region, largest first
    pub matchlists_by_region: Vec<(String, u64)>,

    /// Matches per region, largest first
    pub matches_by_region: Vec<(String, u64)>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The store to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(StoreError)` - Failed to query the store
pub fn load_statistics(store: &dyn EntityStore) -> StoreResult<CrawlStatistics> {
    Ok(CrawlStatistics {
        matchlists: store.count(EntityKind::Matchlist)?,
        matches: store.count(EntityKind::Match)?,
        failed_matches: store.count_failures()?,
        matchlists_by_region: store.count_by_region(EntityKind::Matchlist)?,
        matches_by_region: store.count_by_region(EntityKind::Match)?,
    })
}

fn print_breakdown(title: &str, total: u64, counts: &[(String, u64)]) {
    if counts.is_empty() {
        return;
    }

    println!("{} by Region:", title);
    for (region, count) in counts {
        let percentage = if total > 0 {
            (*count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", region, count, percentage);
    }
    println!();
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Players stored: {}", stats.matchlists);
    println!("  Matches stored: {}", stats.matches);
    println!("  Matches failing: {}", stats.failed_matches);
    println!();

    print_breakdown("Players", stats.matchlists, &stats.matchlists_by_region);
    print_breakdown("Matches", stats.matches, &stats.matches_by_region);

    let attempted = stats.matches + stats.failed_matches;
    if attempted > 0 {
        let success_rate = (stats.matches as f64 / attempted as f64) * 100.0;
        println!("Match success rate: {:.1}%", success_rate);
    }
}

/// Prints what a single crawl session did
pub fn print_session(stats: &SessionStats) {
    println!("\n=== Session Summary ===");
    println!(
        "  Players: {} visited, {} stored, {} failed",
        stats.players_visited, stats.players_stored, stats.players_failed
    );
    println!(
        "  Matches: {} stored, {} skipped, {} failed",
        stats.matches_stored, stats.matches_skipped, stats.matches_failed
    );
}
