pub mod models;
pub mod providers;

pub use databank_catalog as catalog;
