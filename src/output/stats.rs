//! Run statistics
//!
//! This module collects the counters of a finished run and renders them
//! for the terminal.

use crate::output::run_log::FlushOutcome;
use crate::warmer::WarmTally;

/// Counters describing one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Sites that were attempted
    pub sites_processed: usize,

    /// URLs discovered through sitemaps, over all sites
    pub urls_found: usize,

    /// URLs that warmed successfully
    pub warmed_ok: usize,

    /// URLs whose warm request failed after retries
    pub warmed_error: usize,

    /// Purges requested for URLs the origin served cold
    pub purges_requested: usize,

    /// Rows written to the run log
    pub rows_logged: usize,

    /// Rows accepted by the export destination
    pub rows_exported: usize,
}

impl RunStatistics {
    /// Adds one site's warming counters
    pub fn record_site(&mut self, urls_found: usize, tally: &WarmTally) {
        self.sites_processed += 1;
        self.urls_found += urls_found;
        self.warmed_ok += tally.warmed_ok;
        self.warmed_error += tally.warmed_error;
        self.purges_requested += tally.purges_requested;
    }

    /// Records what the final flush did
    pub fn record_export(&mut self, outcome: &FlushOutcome) {
        if let FlushOutcome::Exported { rows, .. } = outcome {
            self.rows_exported = *rows;
        }
    }

    /// Share of warmed URLs that succeeded, in percent
    pub fn success_rate(&self) -> f64 {
        let attempted = self.warmed_ok + self.warmed_error;
        if attempted > 0 {
            (self.warmed_ok as f64 / attempted as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Warm Statistics ===\n");

    println!("Overview:");
    println!("  Sites processed: {}", stats.sites_processed);
    println!("  URLs found: {}", stats.urls_found);
    println!("  Purges requested: {}", stats.purges_requested);
    println!();

    println!("Results:");
    println!("  Warmed: {}", stats.warmed_ok);
    println!("  Failed: {}", stats.warmed_error);
    println!(
        "  Rows logged: {} ({} exported)",
        stats.rows_logged, stats.rows_exported
    );
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} URLs warmed)",
        stats.success_rate(),
        stats.warmed_ok,
        stats.warmed_ok + stats.warmed_error
    );
}
