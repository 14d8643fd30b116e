// Presentation layer - HTTP surface of the document store
pub mod app_state;
pub mod handlers;
pub mod router;
