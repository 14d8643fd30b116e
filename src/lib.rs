//! Dashboard grid engine: placement and drag on a fixed cell grid, widget
//! lifecycle reconciliation, and the dashboards document store.
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
