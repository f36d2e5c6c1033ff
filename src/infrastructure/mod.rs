pub mod config;
pub mod database;
pub mod logging;
pub mod middleware;
pub mod proposal_repository;
pub mod rate_limiter;
pub mod shutdown;

pub use config::{AppConfig, ConfigError, DatabaseConfig, Environment};
pub use proposal_repository::{
    InMemoryProposalRepository, PgProposalRepository, ProposalRepositoryError,
    ProposalRepositoryTrait,
};
pub use rate_limiter::{RateLimitConfig, RateLimiter};
