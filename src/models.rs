pub mod application;
pub mod bulk;
pub mod catalog;
