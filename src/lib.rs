pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod web;

// Re-export commonly used types
pub use application::ProposalService;
pub use domain::{NewProposal, Proposal};
pub use infrastructure::proposal_repository::ProposalRepositoryTrait;
pub use infrastructure::{
    AppConfig, InMemoryProposalRepository, PgProposalRepository, RateLimitConfig, RateLimiter,
};
pub use web::create_router;
