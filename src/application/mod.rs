pub mod canvas;
pub mod dashboard_session;
pub mod dashboard_store;
pub mod document_repository;
pub mod document_service;
pub mod drag_controller;
pub mod grid;
pub mod persistence_gateway;
pub mod widget_host;
pub mod widget_registry;
