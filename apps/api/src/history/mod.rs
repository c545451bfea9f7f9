// Saved analyses: list, search, fetch, delete and re-run.

pub mod handlers;
pub mod repository;
