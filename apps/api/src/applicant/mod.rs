// Applicant profiles: storage, the profile lookup used by the recommendation
// engine, and the profile write path.

pub mod handlers;
pub mod repository;
