use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{RepositoryError, Store};
use crate::models::card::{CreateCardData, EnrollmentCard};
use crate::services::verification_code::{self, generate_code};

/// Attempts at finding an unused generated code before giving up
pub const MAX_CODE_ATTEMPTS: u32 = 5;

/// Source of fresh verification codes
pub type CodeGenerator = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum CardIssuanceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Training not found")]
    TrainingNotFound,

    #[error("Card not found")]
    CardNotFound,

    #[error("Verification code {0} is already in use")]
    DuplicateCode(String),

    #[error("Could not allocate a unique verification code after {0} attempts")]
    CodeSpaceExhausted(u32),

    #[error("Storage error: {0}")]
    Storage(#[from] RepositoryError),
}

impl CardIssuanceError {
    fn from_repository(err: RepositoryError) -> Self {
        match err {
            RepositoryError::MissingReference("training") => CardIssuanceError::TrainingNotFound,
            other => CardIssuanceError::Storage(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Unspecified,
}

/// Card as submitted by an operator. Required fields are optional here so
/// that their absence surfaces as a validation error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrollmentCardDraft {
    pub training_id: Option<Uuid>,
    pub student_name: Option<String>,
    /// Left empty in normal use; a code is generated
    pub verification_code: Option<String>,
    /// When present, the printed name gets a Sr./Sra. prefix
    pub student_gender: Option<Gender>,
}

/// Printed names are stored trimmed and uppercase
pub fn normalize_student_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Prefixes a form of address unless the name already carries one
pub fn with_honorific(name: &str, gender: Gender) -> String {
    let name = name.trim();
    if name.is_empty() || name.to_uppercase().starts_with("SR") {
        return name.to_string();
    }

    let prefix = match gender {
        Gender::Male => "Sr. ",
        Gender::Female => "Sra. ",
        Gender::Unspecified => "Sr./Sra. ",
    };
    format!("{}{}", prefix, name)
}

/// Issues enrollment cards and owns their verification codes
#[derive(Clone)]
pub struct CardIssuer {
    store: Arc<dyn Store>,
    generate: CodeGenerator,
}

impl CardIssuer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_code_generator(store, Arc::new(generate_code))
    }

    pub fn with_code_generator(store: Arc<dyn Store>, generate: CodeGenerator) -> Self {
        Self { store, generate }
    }

    /// Validates a draft, normalizes the student name and stores the card
    /// with a unique verification code.
    ///
    /// A generated code that collides is replaced, up to `MAX_CODE_ATTEMPTS`
    /// tries. A code supplied in the draft is never replaced.
    #[tracing::instrument(skip(self, draft), fields(training_id = ?draft.training_id))]
    pub async fn issue_on_create(
        &self,
        draft: EnrollmentCardDraft,
    ) -> Result<EnrollmentCard, CardIssuanceError> {
        let training_id = draft
            .training_id
            .ok_or_else(|| CardIssuanceError::Validation("training_id is required".to_string()))?;

        let raw_name = draft
            .student_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| CardIssuanceError::Validation("student_name is required".to_string()))?;

        let student_name = match draft.student_gender {
            Some(gender) => normalize_student_name(&with_honorific(raw_name, gender)),
            None => normalize_student_name(raw_name),
        };

        if self.store.find_training_by_id(training_id).await?.is_none() {
            return Err(CardIssuanceError::TrainingNotFound);
        }

        if let Some(code) = draft.verification_code.filter(|c| !c.is_empty()) {
            if !verification_code::is_well_formed(&code) {
                return Err(CardIssuanceError::Validation(format!(
                    "verification_code must be {} uppercase hexadecimal characters",
                    verification_code::CODE_LENGTH
                )));
            }

            return match self.insert(training_id, &student_name, code.clone()).await {
                Err(RepositoryError::DuplicateVerificationCode) => {
                    tracing::warn!("Supplied verification code already in use");
                    Err(CardIssuanceError::DuplicateCode(code))
                }
                other => other.map_err(CardIssuanceError::from_repository),
            };
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = (self.generate)();
            match self.insert(training_id, &student_name, code).await {
                Ok(card) => return Ok(card),
                Err(RepositoryError::DuplicateVerificationCode) => {
                    tracing::warn!(attempt, "Generated verification code collided, regenerating");
                }
                Err(e) => return Err(CardIssuanceError::from_repository(e)),
            }
        }

        tracing::error!(
            attempts = MAX_CODE_ATTEMPTS,
            "Verification code generation keeps colliding"
        );
        Err(CardIssuanceError::CodeSpaceExhausted(MAX_CODE_ATTEMPTS))
    }

    async fn insert(
        &self,
        training_id: Uuid,
        student_name: &str,
        verification_code: String,
    ) -> Result<EnrollmentCard, RepositoryError> {
        let card = self
            .store
            .insert_card(CreateCardData {
                training_id,
                student_name: student_name.to_string(),
                verification_code,
            })
            .await?;

        tracing::info!(card_id = %card.id, training_id = %training_id, "Card issued");
        Ok(card)
    }

    /// Renames the student on a card. The verification code is untouched.
    #[tracing::instrument(skip(self, new_name))]
    pub async fn update_name(
        &self,
        card_id: Uuid,
        new_name: &str,
    ) -> Result<EnrollmentCard, CardIssuanceError> {
        let student_name = normalize_student_name(new_name);
        if student_name.is_empty() {
            return Err(CardIssuanceError::Validation(
                "student_name must not be empty".to_string(),
            ));
        }

        let card = self
            .store
            .update_card_name(card_id, &student_name)
            .await?
            .ok_or(CardIssuanceError::CardNotFound)?;

        tracing::info!(card_id = %card.id, "Card renamed");
        Ok(card)
    }

    /// Removes a single card
    #[tracing::instrument(skip(self))]
    pub async fn remove_card(&self, card_id: Uuid) -> Result<(), CardIssuanceError> {
        if !self.store.delete_card(card_id).await? {
            return Err(CardIssuanceError::CardNotFound);
        }

        tracing::info!(card_id = %card_id, "Card removed");
        Ok(())
    }
}
