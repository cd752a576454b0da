pub mod episode;
pub mod query;
pub mod release;
