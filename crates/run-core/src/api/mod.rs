pub mod classify;
pub mod client;
pub mod fanout;
pub mod models;
pub mod operation;
pub mod pagination;
pub mod region;
pub mod resource;
