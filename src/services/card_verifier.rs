use serde::Serialize;
use uuid::Uuid;

use crate::db::{RepositoryError, Store};
use crate::models::{card::EnrollmentCard, company::Company, training::Training};

#[derive(thiserror::Error, Debug)]
pub enum VerificationError {
    #[error("Storage error: {0}")]
    Storage(#[from] RepositoryError),

    #[error("Card {card_id} references a missing {missing}")]
    DanglingCard {
        card_id: Uuid,
        missing: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationResult {
    Found {
        card: EnrollmentCard,
        training: Training,
        company: Company,
    },
    NotFound {
        code: String,
    },
}

impl VerificationResult {
    /// Returns the result type as a string for logging
    pub fn result_type(&self) -> &'static str {
        match self {
            VerificationResult::Found { .. } => "found",
            VerificationResult::NotFound { .. } => "not_found",
        }
    }

    /// Returns the card_id if a card matched
    pub fn card_id(&self) -> Option<Uuid> {
        match self {
            VerificationResult::Found { card, .. } => Some(card.id),
            VerificationResult::NotFound { .. } => None,
        }
    }
}

/// Resolves a public verification code to its card, training and company.
///
/// The code comes straight from an unauthenticated URL. Lookup is exact and
/// case-sensitive and nothing is written.
#[tracing::instrument(skip(store, code), fields(code_len = code.len()))]
pub async fn resolve(store: &dyn Store, code: &str) -> Result<VerificationResult, VerificationError> {
    // Postgres text cannot hold NUL, so no stored code can match
    if code.contains('\0') {
        tracing::info!(result = "not_found", "Rejected code containing NUL");
        return Ok(VerificationResult::NotFound {
            code: code.to_string(),
        });
    }

    let card = match store.find_card_by_code(code).await? {
        Some(c) => c,
        None => {
            tracing::info!(result = "not_found", "Verification code not found");
            return Ok(VerificationResult::NotFound {
                code: code.to_string(),
            });
        }
    };

    let training = store
        .find_training_by_id(card.training_id)
        .await?
        .ok_or_else(|| {
            tracing::error!(card_id = %card.id, training_id = %card.training_id, "Training not found for card");
            VerificationError::DanglingCard {
                card_id: card.id,
                missing: "training",
            }
        })?;

    let company = store
        .find_company_by_id(training.company_id)
        .await?
        .ok_or_else(|| {
            tracing::error!(card_id = %card.id, company_id = %training.company_id, "Company not found for training");
            VerificationError::DanglingCard {
                card_id: card.id,
                missing: "company",
            }
        })?;

    tracing::info!(card_id = %card.id, result = "found", "Card verified");

    Ok(VerificationResult::Found {
        card,
        training,
        company,
    })
}
