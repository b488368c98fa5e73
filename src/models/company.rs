use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub logo: Option<Vec<u8>>, // PNG bytes
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateCompanyData {
    pub name: String,
    pub logo: Option<Vec<u8>>,
}

impl Company {
    /// Creates a new company
    pub async fn create(pool: &PgPool, data: CreateCompanyData) -> Result<Self, sqlx::Error> {
        let company = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO companies (name, logo)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.logo)
        .fetch_one(pool)
        .await?;

        Ok(company)
    }

    /// Finds a company by its ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let company = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM companies WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(company)
    }
}
