//! Inbound ports (Use case traits)

use async_trait::async_trait;

use crate::application::dto::{AssembledForm, RequestContext};
use crate::domain::aggregates::FormSession;
use crate::domain::value_objects::AnswerState;

/// Form assembly use cases
#[async_trait]
pub trait FormAssemblyUseCases: Send + Sync {
    /// Resolve and organize the fields of a request context
    async fn assemble(&self, context: &RequestContext) -> Result<AssembledForm, UseCaseError>;

    /// Assemble a form and open a session over it, seeded with prior answers
    async fn open_session(
        &self,
        context: &RequestContext,
        answers: AnswerState,
    ) -> Result<FormSession, UseCaseError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UseCaseError {
    #[error("Invalid request context: {0}")]
    InvalidContext(String),
}
