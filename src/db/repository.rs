//! Storage seams for the card and training records.
//!
//! Services only talk to these traits. `PgStore` backs them with Postgres
//! and `MemoryStore` with in-process maps.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    card::{CreateCardData, EnrollmentCard},
    company::{Company, CreateCompanyData},
    training::{CreateTrainingData, Training, UpdateTrainingData},
};

#[derive(thiserror::Error, Debug)]
pub enum RepositoryError {
    #[error("Verification code already in use")]
    DuplicateVerificationCode,

    #[error("Referenced {0} does not exist")]
    MissingReference(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence for enrollment cards
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Inserts a card. Fails with `DuplicateVerificationCode` if the code is
    /// taken and `MissingReference("training")` if the training is gone.
    async fn insert_card(&self, data: CreateCardData) -> Result<EnrollmentCard, RepositoryError>;

    async fn find_card_by_id(&self, id: Uuid) -> Result<Option<EnrollmentCard>, RepositoryError>;

    /// Exact, case-sensitive lookup on the unique code
    async fn find_card_by_code(
        &self,
        code: &str,
    ) -> Result<Option<EnrollmentCard>, RepositoryError>;

    async fn list_cards_by_training(
        &self,
        training_id: Uuid,
    ) -> Result<Vec<EnrollmentCard>, RepositoryError>;

    /// Returns `None` when the card does not exist
    async fn update_card_name(
        &self,
        id: Uuid,
        student_name: &str,
    ) -> Result<Option<EnrollmentCard>, RepositoryError>;

    async fn delete_card(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

/// Persistence for trainings and the companies that own them
#[async_trait]
pub trait TrainingRepository: Send + Sync {
    async fn insert_company(&self, data: CreateCompanyData) -> Result<Company, RepositoryError>;

    async fn find_company_by_id(&self, id: Uuid) -> Result<Option<Company>, RepositoryError>;

    /// Fails with `MissingReference("company")` for an unknown company
    async fn insert_training(&self, data: CreateTrainingData)
        -> Result<Training, RepositoryError>;

    async fn find_training_by_id(&self, id: Uuid) -> Result<Option<Training>, RepositoryError>;

    async fn list_trainings(&self) -> Result<Vec<Training>, RepositoryError>;

    /// Returns `None` when the training does not exist
    async fn update_training(
        &self,
        id: Uuid,
        data: UpdateTrainingData,
    ) -> Result<Option<Training>, RepositoryError>;

    /// Deletes the training together with all of its cards
    async fn delete_training(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

/// Everything the application needs from storage
#[async_trait]
pub trait Store: CardRepository + TrainingRepository {
    /// Cheap round trip used by the health check
    async fn ping(&self) -> Result<(), RepositoryError>;
}
