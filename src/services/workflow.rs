// src/services/workflow.rs

//! Máquinas de estado da aplicação e do lote. Toda mudança de status passa
//! por [`transition`] ou [`bulk_transition`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{application::ApplicationStatus, bulk::BulkSubmissionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationAction {
    /// pending -> in_review
    Submit,
    /// in_review -> completed
    Complete,
    /// in_review -> rejected
    Reject,
    /// Decisão item a item; não muda o status (in_review -> in_review)
    Review,
}

/// Quem está agindo. A identidade em si fica fora deste serviço.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Customer,
    CustomerService,
    Reviewer,
    /// Processos internos (worker de lotes).
    System,
}

impl ActorRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ActorRole::Customer => "customer",
            ActorRole::CustomerService => "customer_service",
            ActorRole::Reviewer => "reviewer",
            ActorRole::System => "system",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(ActorRole::Customer),
            "customer_service" => Ok(ActorRole::CustomerService),
            "reviewer" => Ok(ActorRole::Reviewer),
            "system" => Ok(ActorRole::System),
            other => Err(format!("papel desconhecido: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("A aplicação já está finalizada ({current}) e não pode ser reaberta")]
    Terminal { current: ApplicationStatus },

    #[error("Ação {action:?} não é permitida a partir do status {current}")]
    NotAllowed { current: ApplicationStatus, action: ApplicationAction },

    #[error("O papel '{role}' não pode executar {action:?}")]
    Forbidden { role: ActorRole, action: ApplicationAction },

    #[error("Lote em {current} não aceita {action:?}")]
    Bulk { current: BulkSubmissionStatus, action: BulkAction },
}

/// Única porta de entrada para mudar o status de uma aplicação.
pub fn transition(
    current: ApplicationStatus,
    action: ApplicationAction,
    role: ActorRole,
) -> Result<ApplicationStatus, TransitionError> {
    use ApplicationAction::*;
    use ApplicationStatus::*;

    if current.is_terminal() {
        return Err(TransitionError::Terminal { current });
    }

    let allowed_role = match action {
        Submit => matches!(role, ActorRole::Customer | ActorRole::CustomerService | ActorRole::System),
        Complete | Reject | Review => matches!(role, ActorRole::Reviewer | ActorRole::System),
    };
    if !allowed_role {
        return Err(TransitionError::Forbidden { role, action });
    }

    match (current, action) {
        (Pending, Submit) => Ok(InReview),
        (InReview, Complete) => Ok(Completed),
        (InReview, Reject) => Ok(Rejected),
        (InReview, Review) => Ok(InReview),
        _ => Err(TransitionError::NotAllowed { current, action }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    /// DRAFT -> PROCESSING
    Dispatch,
    /// PROCESSING -> SUCCESS | FAIL
    Finish { success: bool },
}

pub fn bulk_transition(
    current: BulkSubmissionStatus,
    action: BulkAction,
) -> Result<BulkSubmissionStatus, TransitionError> {
    match (current, action) {
        (BulkSubmissionStatus::Draft, BulkAction::Dispatch) => Ok(BulkSubmissionStatus::Processing),
        (BulkSubmissionStatus::Processing, BulkAction::Finish { success: true }) => {
            Ok(BulkSubmissionStatus::Success)
        }
        (BulkSubmissionStatus::Processing, BulkAction::Finish { success: false }) => {
            Ok(BulkSubmissionStatus::Fail)
        }
        _ => Err(TransitionError::Bulk { current, action }),
    }
}
