pub mod collection;
pub mod documents;
pub mod health;
pub mod query;
