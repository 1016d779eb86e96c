// src/handlers.rs

pub mod applications;
pub mod bulk;
pub mod catalog;
