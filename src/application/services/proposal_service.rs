use std::sync::Arc;

use tracing::debug;

use crate::domain::{NewProposal, Proposal};
use crate::infrastructure::proposal_repository::{
    ProposalRepositoryError, ProposalRepositoryTrait,
};

/// Entry point for the proposal endpoints. Every call goes straight to the store;
/// nothing is cached in process.
#[derive(Clone)]
pub struct ProposalService {
    repository: Arc<dyn ProposalRepositoryTrait>,
}

impl ProposalService {
    pub fn new(repository: Arc<dyn ProposalRepositoryTrait>) -> Self {
        Self { repository }
    }

    pub async fn submit(&self, proposal: NewProposal) -> Result<Proposal, ProposalRepositoryError> {
        debug!(name = ?proposal.name, "Submitting proposal");
        let stored = self.repository.insert(proposal).await?;
        debug!(id = stored.id, "Proposal stored");
        Ok(stored)
    }

    pub async fn list(&self) -> Result<Vec<Proposal>, ProposalRepositoryError> {
        let proposals = self.repository.list_all().await?;
        debug!(count = proposals.len(), "Listed proposals");
        Ok(proposals)
    }
}
