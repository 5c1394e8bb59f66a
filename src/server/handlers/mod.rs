pub mod embed;
pub mod generate;
pub mod health;
pub mod query;
pub mod stats;
pub mod validation;
