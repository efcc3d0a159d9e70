pub mod form;
pub mod render;
pub mod service;
