pub mod field;
pub mod turbo;
