pub mod config_service;
pub mod resource_service;
pub mod settings;
