// Domain layer - Grid geometry and persisted dashboard state
pub mod collision;
pub mod coordinates;
pub mod dashboard;
pub mod item;
pub mod range;
