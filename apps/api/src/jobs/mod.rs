// Job records and the create/rematch pipeline that feeds the match relations.

pub mod documents;
pub mod handlers;
pub mod service;
