// Job write paths. Every change here can alter match sets, so each one ends
// with a global recommendation eviction.

pub mod handlers;
pub mod repository;
