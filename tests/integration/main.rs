//! Integration tests for Edge-Warmer
//!
//! Mock servers stand in for the outbound proxy, the purge API and the
//! export webhook, so whole runs execute without touching the network.

mod config_tests;
mod warm_run_tests;
