//! Integration tests for dropsync-sync
//!
//! Runs the lister, reconciler, transfer engine and orchestrator against an
//! in-memory remote store and a temporary local directory.


mod test_engine;
mod test_listing;
