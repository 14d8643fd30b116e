// Application state for HTTP handlers
use crate::application::document_service::DocumentService;
use crate::domain::coordinates::CoordinateModel;

#[derive(Clone)]
pub struct AppState {
    pub document_service: DocumentService,
    pub grid: CoordinateModel,
}
