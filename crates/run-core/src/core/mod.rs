pub mod console;
pub mod models;
pub mod services;
