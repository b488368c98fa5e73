use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Unique index backing verification code uniqueness.
pub const VERIFICATION_CODE_CONSTRAINT: &str = "enrollment_cards_verification_code_key";

/// A student's credential card ("carteira") for one training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EnrollmentCard {
    pub id: Uuid,
    pub training_id: Uuid,
    pub student_name: String,
    pub verification_code: String, // 32 uppercase hex chars, write-once
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Normalized card fields, ready to be stored.
#[derive(Debug, Clone)]
pub struct CreateCardData {
    pub training_id: Uuid,
    pub student_name: String,
    pub verification_code: String,
}

impl EnrollmentCard {
    /// Creates a new card
    pub async fn create(pool: &PgPool, data: CreateCardData) -> Result<Self, sqlx::Error> {
        let card = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO enrollment_cards (training_id, student_name, verification_code)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(data.training_id)
        .bind(&data.student_name)
        .bind(&data.verification_code)
        .fetch_one(pool)
        .await?;

        Ok(card)
    }

    /// Finds a card by its internal ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let card = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM enrollment_cards WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(card)
    }

    /// Finds a card by its verification code (exact, case-sensitive)
    pub async fn find_by_verification_code(
        pool: &PgPool,
        code: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let card = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM enrollment_cards WHERE verification_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(pool)
        .await?;

        Ok(card)
    }

    /// Lists the cards enrolled in a training, in enrollment order
    pub async fn list_by_training(
        pool: &PgPool,
        training_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let cards = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM enrollment_cards
            WHERE training_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(training_id)
        .fetch_all(pool)
        .await?;

        Ok(cards)
    }

    /// Updates the printed student name
    pub async fn update_student_name(
        pool: &PgPool,
        id: Uuid,
        student_name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let card = sqlx::query_as::<_, Self>(
            r#"
            UPDATE enrollment_cards
            SET student_name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(student_name)
        .fetch_optional(pool)
        .await?;

        Ok(card)
    }

    /// Deletes a card
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM enrollment_cards WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
