pub mod cache;
pub mod id_generator;
pub mod rate_limit;
