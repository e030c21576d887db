// Application layer - Use cases over the domain core
pub mod dashboard_service;
pub mod date_index;
pub mod pipeline;
pub mod record_source;
