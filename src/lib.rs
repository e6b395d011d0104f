//! Status Center - central status dashboard and event log for a plugin suite
//!
//! Suite components log through a shared [`logger::SuiteLogger`]; events below
//! the configured minimum severity are dropped before they reach the store.

pub mod config;
pub mod diagnostics;
pub mod logger;
pub mod server;
pub mod settings;
pub mod severity;
pub mod store;
pub mod suite;
