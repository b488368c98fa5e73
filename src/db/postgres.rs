use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::repository::{CardRepository, RepositoryError, Store, TrainingRepository};
use crate::models::{
    card::{CreateCardData, EnrollmentCard, VERIFICATION_CODE_CONSTRAINT},
    company::{Company, CreateCompanyData},
    training::{CreateTrainingData, Training, UpdateTrainingData},
};

/// Postgres-backed store. Uniqueness of verification codes is enforced by the
/// `enrollment_cards_verification_code_key` index.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps constraint violations to typed errors; everything else stays a
/// database error.
fn classify(err: sqlx::Error, referenced: &'static str) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation()
            && db_err.constraint() == Some(VERIFICATION_CODE_CONSTRAINT)
        {
            return RepositoryError::DuplicateVerificationCode;
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::MissingReference(referenced);
        }
    }
    RepositoryError::Database(err)
}

#[async_trait]
impl CardRepository for PgStore {
    async fn insert_card(&self, data: CreateCardData) -> Result<EnrollmentCard, RepositoryError> {
        EnrollmentCard::create(&self.pool, data)
            .await
            .map_err(|e| classify(e, "training"))
    }

    async fn find_card_by_id(&self, id: Uuid) -> Result<Option<EnrollmentCard>, RepositoryError> {
        Ok(EnrollmentCard::find_by_id(&self.pool, id).await?)
    }

    async fn find_card_by_code(
        &self,
        code: &str,
    ) -> Result<Option<EnrollmentCard>, RepositoryError> {
        Ok(EnrollmentCard::find_by_verification_code(&self.pool, code).await?)
    }

    async fn list_cards_by_training(
        &self,
        training_id: Uuid,
    ) -> Result<Vec<EnrollmentCard>, RepositoryError> {
        Ok(EnrollmentCard::list_by_training(&self.pool, training_id).await?)
    }

    async fn update_card_name(
        &self,
        id: Uuid,
        student_name: &str,
    ) -> Result<Option<EnrollmentCard>, RepositoryError> {
        Ok(EnrollmentCard::update_student_name(&self.pool, id, student_name).await?)
    }

    async fn delete_card(&self, id: Uuid) -> Result<bool, RepositoryError> {
        Ok(EnrollmentCard::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl TrainingRepository for PgStore {
    async fn insert_company(&self, data: CreateCompanyData) -> Result<Company, RepositoryError> {
        Ok(Company::create(&self.pool, data).await?)
    }

    async fn find_company_by_id(&self, id: Uuid) -> Result<Option<Company>, RepositoryError> {
        Ok(Company::find_by_id(&self.pool, id).await?)
    }

    async fn insert_training(
        &self,
        data: CreateTrainingData,
    ) -> Result<Training, RepositoryError> {
        Training::create(&self.pool, data)
            .await
            .map_err(|e| classify(e, "company"))
    }

    async fn find_training_by_id(&self, id: Uuid) -> Result<Option<Training>, RepositoryError> {
        Ok(Training::find_by_id(&self.pool, id).await?)
    }

    async fn list_trainings(&self) -> Result<Vec<Training>, RepositoryError> {
        Ok(Training::list_all(&self.pool).await?)
    }

    async fn update_training(
        &self,
        id: Uuid,
        data: UpdateTrainingData,
    ) -> Result<Option<Training>, RepositoryError> {
        Ok(Training::update(&self.pool, id, data).await?)
    }

    async fn delete_training(&self, id: Uuid) -> Result<bool, RepositoryError> {
        Ok(Training::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
