use chrono::NaiveDate;
use uuid::Uuid;

use crate::db::{RepositoryError, Store};
use crate::models::{
    card::EnrollmentCard,
    company::{Company, CreateCompanyData},
    training::{
        default_validity_date, CreateTrainingData, Training, UpdateTrainingData,
        DEFAULT_WORKLOAD_HOURS,
    },
};

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Company not found")]
    CompanyNotFound,

    #[error("Training not found")]
    TrainingNotFound,

    #[error("Storage error: {0}")]
    Storage(#[from] RepositoryError),
}

/// Training as submitted by an operator
#[derive(Debug, Clone, Default)]
pub struct TrainingDraft {
    pub company_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub training_date: Option<NaiveDate>,
    /// Defaults to two years after `training_date`
    pub validity_date: Option<NaiveDate>,
    /// Defaults to `DEFAULT_WORKLOAD_HOURS`
    pub workload_hours: Option<f64>,
    pub coordinator_name: Option<String>,
    pub instructor_name: Option<String>,
    pub instructor_signature: Option<Vec<u8>>,
    pub coordinator_signature: Option<Vec<u8>>,
}

/// Partial edit of a training. Absent fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct TrainingPatch {
    pub name: Option<String>,
    /// An empty string clears the description
    pub description: Option<String>,
    /// Moving the date re-derives validity unless `validity_date` is also given
    pub training_date: Option<NaiveDate>,
    pub validity_date: Option<NaiveDate>,
    pub workload_hours: Option<f64>,
    pub coordinator_name: Option<String>,
    pub instructor_name: Option<String>,
    pub instructor_signature: Option<Vec<u8>>,
    pub coordinator_signature: Option<Vec<u8>>,
}

/// A training with its company and enrolled cards
#[derive(Debug, Clone)]
pub struct TrainingOverview {
    pub training: Training,
    pub company: Company,
    pub cards: Vec<EnrollmentCard>,
}

impl TrainingOverview {
    pub fn student_count(&self) -> usize {
        self.cards.len()
    }
}

fn required_text(value: Option<String>, field: &str) -> Result<String, RegistryError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RegistryError::Validation(format!("{} is required", field)))
}

fn patched_text(
    value: Option<String>,
    field: &str,
    stored: String,
) -> Result<String, RegistryError> {
    match value {
        Some(v) => required_text(Some(v), field),
        None => Ok(stored),
    }
}

/// Explicit validity, or two years after `training_date`; never before it
fn checked_validity(
    training_date: NaiveDate,
    validity_date: Option<NaiveDate>,
) -> Result<NaiveDate, RegistryError> {
    let validity_date = match validity_date {
        Some(date) => date,
        None => default_validity_date(training_date).ok_or_else(|| {
            RegistryError::Validation("training_date is out of range".to_string())
        })?,
    };
    if validity_date < training_date {
        return Err(RegistryError::Validation(
            "validity_date must not precede training_date".to_string(),
        ));
    }
    Ok(validity_date)
}

fn checked_workload(workload_hours: f64) -> Result<f64, RegistryError> {
    if !workload_hours.is_finite() || workload_hours <= 0.0 {
        return Err(RegistryError::Validation(
            "workload_hours must be a positive number".to_string(),
        ));
    }
    Ok(workload_hours)
}

pub async fn register_company(
    store: &dyn Store,
    name: &str,
    logo: Option<Vec<u8>>,
) -> Result<Company, RegistryError> {
    let name = required_text(Some(name.to_string()), "name")?;

    let company = store.insert_company(CreateCompanyData { name, logo }).await?;

    tracing::info!(company_id = %company.id, "Company registered");
    Ok(company)
}

#[tracing::instrument(skip(store, draft), fields(company_id = ?draft.company_id))]
pub async fn register_training(
    store: &dyn Store,
    draft: TrainingDraft,
) -> Result<Training, RegistryError> {
    let company_id = draft
        .company_id
        .ok_or_else(|| RegistryError::Validation("company_id is required".to_string()))?;
    let name = required_text(draft.name, "name")?;
    let coordinator_name = required_text(draft.coordinator_name, "coordinator_name")?;
    let instructor_name = required_text(draft.instructor_name, "instructor_name")?;
    let training_date = draft
        .training_date
        .ok_or_else(|| RegistryError::Validation("training_date is required".to_string()))?;

    let validity_date = checked_validity(training_date, draft.validity_date)?;
    let workload_hours = checked_workload(draft.workload_hours.unwrap_or(DEFAULT_WORKLOAD_HOURS))?;
    let description = draft
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let training = store
        .insert_training(CreateTrainingData {
            company_id,
            name,
            description,
            training_date,
            validity_date,
            workload_hours,
            coordinator_name,
            instructor_name,
            instructor_signature: draft.instructor_signature,
            coordinator_signature: draft.coordinator_signature,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::MissingReference(_) => RegistryError::CompanyNotFound,
            other => RegistryError::Storage(other),
        })?;

    tracing::info!(training_id = %training.id, validity_date = %training.validity_date, "Training registered");
    Ok(training)
}

pub async fn training_overview(
    store: &dyn Store,
    training_id: Uuid,
) -> Result<TrainingOverview, RegistryError> {
    let training = store
        .find_training_by_id(training_id)
        .await?
        .ok_or(RegistryError::TrainingNotFound)?;

    let company = store
        .find_company_by_id(training.company_id)
        .await?
        .ok_or(RegistryError::CompanyNotFound)?;

    let cards = store.list_cards_by_training(training.id).await?;

    Ok(TrainingOverview {
        training,
        company,
        cards,
    })
}

/// Applies a patch to a stored training. Enrolled cards and their codes are
/// left alone.
#[tracing::instrument(skip(store, patch))]
pub async fn update_training(
    store: &dyn Store,
    training_id: Uuid,
    patch: TrainingPatch,
) -> Result<Training, RegistryError> {
    let current = store
        .find_training_by_id(training_id)
        .await?
        .ok_or(RegistryError::TrainingNotFound)?;

    let name = patched_text(patch.name, "name", current.name)?;
    let coordinator_name = patched_text(
        patch.coordinator_name,
        "coordinator_name",
        current.coordinator_name,
    )?;
    let instructor_name = patched_text(
        patch.instructor_name,
        "instructor_name",
        current.instructor_name,
    )?;

    let training_date = patch.training_date.unwrap_or(current.training_date);
    let validity_date = match patch.validity_date {
        Some(date) => checked_validity(training_date, Some(date))?,
        None if training_date != current.training_date => {
            checked_validity(training_date, None)?
        }
        None => checked_validity(training_date, Some(current.validity_date))?,
    };
    let workload_hours =
        checked_workload(patch.workload_hours.unwrap_or(current.workload_hours))?;

    let description = match patch.description {
        Some(d) => Some(d.trim().to_string()).filter(|d| !d.is_empty()),
        None => current.description,
    };

    let training = store
        .update_training(
            training_id,
            UpdateTrainingData {
                name,
                description,
                training_date,
                validity_date,
                workload_hours,
                coordinator_name,
                instructor_name,
                instructor_signature: patch
                    .instructor_signature
                    .or(current.instructor_signature),
                coordinator_signature: patch
                    .coordinator_signature
                    .or(current.coordinator_signature),
            },
        )
        .await?
        .ok_or(RegistryError::TrainingNotFound)?;

    tracing::info!(training_id = %training.id, validity_date = %training.validity_date, "Training updated");
    Ok(training)
}

/// Deletes a training and, with it, every enrolled card
pub async fn remove_training(store: &dyn Store, training_id: Uuid) -> Result<(), RegistryError> {
    if !store.delete_training(training_id).await? {
        return Err(RegistryError::TrainingNotFound);
    }

    tracing::info!(training_id = %training_id, "Training removed with its cards");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn draft(company_id: Uuid) -> TrainingDraft {
        TrainingDraft {
            company_id: Some(company_id),
            name: Some("  Reciclagem de Plataforma Elevatória ".to_string()),
            training_date: NaiveDate::from_ymd_opt(2025, 1, 20),
            coordinator_name: Some("Coordenadora".to_string()),
            instructor_name: Some("Instrutor".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_register_training_applies_defaults() {
        let store = MemoryStore::new();
        let company = register_company(&store, "Netcom", None).await.unwrap();

        let training = register_training(&store, draft(company.id)).await.unwrap();

        assert_eq!(training.name, "Reciclagem de Plataforma Elevatória");
        assert_eq!(training.workload_hours, DEFAULT_WORKLOAD_HOURS);
        assert_eq!(
            training.validity_date,
            NaiveDate::from_ymd_opt(2027, 1, 20).unwrap()
        );
        assert_eq!(training.description, None);
    }

    #[tokio::test]
    async fn test_register_training_keeps_explicit_validity() {
        let store = MemoryStore::new();
        let company = register_company(&store, "Netcom", None).await.unwrap();
        let validity = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();

        let training = register_training(
            &store,
            TrainingDraft {
                validity_date: Some(validity),
                workload_hours: Some(4.0),
                ..draft(company.id)
            },
        )
        .await
        .unwrap();

        assert_eq!(training.validity_date, validity);
        assert_eq!(training.workload_hours, 4.0);
    }

    #[tokio::test]
    async fn test_register_training_validation() {
        let store = MemoryStore::new();
        let company = register_company(&store, "Netcom", None).await.unwrap();

        let missing_instructor = TrainingDraft {
            instructor_name: Some(" ".to_string()),
            ..draft(company.id)
        };
        assert!(matches!(
            register_training(&store, missing_instructor).await,
            Err(RegistryError::Validation(_))
        ));

        let bad_workload = TrainingDraft {
            workload_hours: Some(f64::NAN),
            ..draft(company.id)
        };
        assert!(matches!(
            register_training(&store, bad_workload).await,
            Err(RegistryError::Validation(_))
        ));

        assert!(matches!(
            register_training(&store, draft(Uuid::new_v4())).await,
            Err(RegistryError::CompanyNotFound)
        ));
        assert!(matches!(
            register_company(&store, "  ", None).await,
            Err(RegistryError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_overview_and_removal() {
        let store = MemoryStore::new();
        let company = register_company(&store, "Netcom", None).await.unwrap();
        let training = register_training(&store, draft(company.id)).await.unwrap();

        let overview = training_overview(&store, training.id).await.unwrap();
        assert_eq!(overview.company, company);
        assert_eq!(overview.student_count(), 0);

        remove_training(&store, training.id).await.unwrap();
        assert!(matches!(
            training_overview(&store, training.id).await,
            Err(RegistryError::TrainingNotFound)
        ));
        assert!(matches!(
            remove_training(&store, training.id).await,
            Err(RegistryError::TrainingNotFound)
        ));
    }

    #[tokio::test]
    async fn test_moving_training_date_rederives_validity() {
        let store = MemoryStore::new();
        let company = register_company(&store, "Netcom", None).await.unwrap();
        let training = register_training(&store, draft(company.id)).await.unwrap();

        let updated = update_training(
            &store,
            training.id,
            TrainingPatch {
                training_date: NaiveDate::from_ymd_opt(2025, 2, 3),
                instructor_name: Some(" Instrutora Substituta ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.id, training.id);
        assert_eq!(updated.training_date, NaiveDate::from_ymd_opt(2025, 2, 3).unwrap());
        assert_eq!(updated.validity_date, NaiveDate::from_ymd_opt(2027, 2, 3).unwrap());
        assert_eq!(updated.instructor_name, "Instrutora Substituta");
        assert_eq!(updated.name, training.name);
        assert_eq!(updated.workload_hours, training.workload_hours);
    }

    #[tokio::test]
    async fn test_update_keeps_validity_when_date_unchanged() {
        let store = MemoryStore::new();
        let company = register_company(&store, "Netcom", None).await.unwrap();
        let validity = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        let training = register_training(
            &store,
            TrainingDraft {
                validity_date: Some(validity),
                ..draft(company.id)
            },
        )
        .await
        .unwrap();

        let updated = update_training(
            &store,
            training.id,
            TrainingPatch {
                workload_hours: Some(16.0),
                description: Some("Turma da manhã".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.validity_date, validity);
        assert_eq!(updated.workload_hours, 16.0);
        assert_eq!(updated.description.as_deref(), Some("Turma da manhã"));
    }

    #[tokio::test]
    async fn test_update_validation() {
        let store = MemoryStore::new();
        let company = register_company(&store, "Netcom", None).await.unwrap();
        let training = register_training(&store, draft(company.id)).await.unwrap();

        let early_validity = TrainingPatch {
            validity_date: NaiveDate::from_ymd_opt(2024, 12, 31),
            ..Default::default()
        };
        assert!(matches!(
            update_training(&store, training.id, early_validity).await,
            Err(RegistryError::Validation(_))
        ));

        let zero_workload = TrainingPatch {
            workload_hours: Some(0.0),
            ..Default::default()
        };
        assert!(matches!(
            update_training(&store, training.id, zero_workload).await,
            Err(RegistryError::Validation(_))
        ));

        let blank_name = TrainingPatch {
            name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            update_training(&store, training.id, blank_name).await,
            Err(RegistryError::Validation(_))
        ));

        assert!(matches!(
            update_training(&store, Uuid::new_v4(), TrainingPatch::default()).await,
            Err(RegistryError::TrainingNotFound)
        ));

        let stored = training_overview(&store, training.id).await.unwrap().training;
        assert_eq!(stored, training);
    }
}
