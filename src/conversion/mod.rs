pub mod handler;
pub mod model;
pub mod page;
pub mod routes;
pub mod service;
