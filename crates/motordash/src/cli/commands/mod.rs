pub mod analytics;
pub mod ask;
pub mod query;
pub mod seed;
