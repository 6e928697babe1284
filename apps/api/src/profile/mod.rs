// Profile Store: the personal block and the four owned collections.

pub mod handlers;
pub mod service;
