use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgDatabaseError, PgPool};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::{NewProposal, Proposal};

/// Matches the `VARCHAR(255)` column width.
pub const MAX_NAME_LEN: usize = 255;

const NOT_NULL_VIOLATION: &str = "23502";

#[derive(Error, Debug)]
pub enum ProposalRepositoryError {
    #[error("Proposal name is required")]
    MissingName,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

#[async_trait]
pub trait ProposalRepositoryTrait: Send + Sync + 'static {
    async fn insert(&self, proposal: NewProposal) -> Result<Proposal, ProposalRepositoryError>;
    async fn list_all(&self) -> Result<Vec<Proposal>, ProposalRepositoryError>;
}

#[derive(Clone)]
pub struct PgProposalRepository {
    pool: PgPool,
}

impl PgProposalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ProposalRepositoryTrait for PgProposalRepository {
    async fn insert(&self, proposal: NewProposal) -> Result<Proposal, ProposalRepositoryError> {
        sqlx::query_as::<_, Proposal>(
            r#"
            INSERT INTO proposals (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, submitted_at
            "#,
        )
        .bind(proposal.name)
        .bind(proposal.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            if let Some(db_err) = e.as_database_error() {
                if let Some(pg_err) = db_err.try_downcast_ref::<PgDatabaseError>() {
                    if pg_err.code() == NOT_NULL_VIOLATION && pg_err.column() == Some("name") {
                        return ProposalRepositoryError::MissingName;
                    }
                }
            }
            ProposalRepositoryError::DatabaseError(e)
        })
    }

    async fn list_all(&self) -> Result<Vec<Proposal>, ProposalRepositoryError> {
        sqlx::query_as::<_, Proposal>(
            r#"
            SELECT id, name, description, submitted_at
            FROM proposals
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ProposalRepositoryError::DatabaseError)
    }
}

/// Process-local store with the same column rules as the `proposals` table:
/// sequential ids from 1, NOT NULL `name` capped at 255 characters, and
/// `submitted_at` stamped on insert.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProposalRepository {
    rows: Arc<RwLock<Vec<Proposal>>>,
}

impl InMemoryProposalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl ProposalRepositoryTrait for InMemoryProposalRepository {
    async fn insert(&self, proposal: NewProposal) -> Result<Proposal, ProposalRepositoryError> {
        let name = proposal.name.ok_or(ProposalRepositoryError::MissingName)?;
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ProposalRepositoryError::Unexpected(format!(
                "value too long for type character varying({})",
                MAX_NAME_LEN
            )));
        }

        let mut rows = self.rows.write().await;
        let id = rows.last().map(|row| row.id + 1).unwrap_or(1);
        let stored = Proposal {
            id,
            name,
            description: proposal.description,
            submitted_at: Utc::now().naive_utc(),
        };
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn list_all(&self) -> Result<Vec<Proposal>, ProposalRepositoryError> {
        Ok(self.rows.read().await.clone())
    }
}
