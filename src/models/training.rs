use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Workload used when a training is registered without one.
pub const DEFAULT_WORKLOAD_HOURS: f64 = 8.0;

/// Cards stay valid for this long after the training date.
pub const VALIDITY_MONTHS: u32 = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Training {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub training_date: NaiveDate,
    pub validity_date: NaiveDate,
    pub workload_hours: f64,
    pub coordinator_name: String,
    pub instructor_name: String,
    #[serde(skip_serializing)]
    pub instructor_signature: Option<Vec<u8>>, // PNG bytes
    #[serde(skip_serializing)]
    pub coordinator_signature: Option<Vec<u8>>, // PNG bytes
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated training fields, ready to be stored.
#[derive(Debug, Clone)]
pub struct CreateTrainingData {
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub training_date: NaiveDate,
    pub validity_date: NaiveDate,
    pub workload_hours: f64,
    pub coordinator_name: String,
    pub instructor_name: String,
    pub instructor_signature: Option<Vec<u8>>,
    pub coordinator_signature: Option<Vec<u8>>,
}

/// Editable training fields after a patch has been applied and validated.
/// The owning company never changes.
#[derive(Debug, Clone)]
pub struct UpdateTrainingData {
    pub name: String,
    pub description: Option<String>,
    pub training_date: NaiveDate,
    pub validity_date: NaiveDate,
    pub workload_hours: f64,
    pub coordinator_name: String,
    pub instructor_name: String,
    pub instructor_signature: Option<Vec<u8>>,
    pub coordinator_signature: Option<Vec<u8>>,
}

/// Two calendar years after `training_date`. A Feb 29 start clamps to Feb 28.
pub fn default_validity_date(training_date: NaiveDate) -> Option<NaiveDate> {
    training_date.checked_add_months(Months::new(VALIDITY_MONTHS))
}

impl Training {
    /// Creates a new training
    pub async fn create(pool: &PgPool, data: CreateTrainingData) -> Result<Self, sqlx::Error> {
        let training = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO trainings (
                company_id, name, description, training_date, validity_date,
                workload_hours, coordinator_name, instructor_name,
                instructor_signature, coordinator_signature
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(data.company_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.training_date)
        .bind(data.validity_date)
        .bind(data.workload_hours)
        .bind(&data.coordinator_name)
        .bind(&data.instructor_name)
        .bind(&data.instructor_signature)
        .bind(&data.coordinator_signature)
        .fetch_one(pool)
        .await?;

        Ok(training)
    }

    /// Finds a training by its ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let training = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM trainings WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(training)
    }

    /// Lists all trainings, most recent first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let trainings = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM trainings
            ORDER BY training_date DESC, created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(trainings)
    }

    /// Rewrites the editable fields. Returns `None` for an unknown training.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTrainingData,
    ) -> Result<Option<Self>, sqlx::Error> {
        let training = sqlx::query_as::<_, Self>(
            r#"
            UPDATE trainings
            SET name = $2, description = $3, training_date = $4, validity_date = $5,
                workload_hours = $6, coordinator_name = $7, instructor_name = $8,
                instructor_signature = $9, coordinator_signature = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.training_date)
        .bind(data.validity_date)
        .bind(data.workload_hours)
        .bind(&data.coordinator_name)
        .bind(&data.instructor_name)
        .bind(&data.instructor_signature)
        .bind(&data.coordinator_signature)
        .fetch_optional(pool)
        .await?;

        Ok(training)
    }

    /// Deletes a training. Enrolled cards go with it (ON DELETE CASCADE).
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM trainings WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
