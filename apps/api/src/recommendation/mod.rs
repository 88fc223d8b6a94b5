// Recommendation engine: profile normalization, the match predicate, the
// read-through cache and its invalidation. Persistence is reached only
// through `MatchQueryPort` and `ProfileSource`.

pub mod cache;
pub mod error;
pub mod handlers;
pub mod invalidation;
pub mod matching;
pub mod normalizer;
pub mod query;
pub mod service;
pub mod store;
pub mod ttl;

#[cfg(test)]
pub(crate) mod testing;
