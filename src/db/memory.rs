//! In-process store used by tests and local experiments.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::repository::{CardRepository, RepositoryError, Store, TrainingRepository};
use crate::models::{
    card::{CreateCardData, EnrollmentCard},
    company::{Company, CreateCompanyData},
    training::{CreateTrainingData, Training, UpdateTrainingData},
};

#[derive(Default)]
struct Tables {
    companies: HashMap<Uuid, Company>,
    trainings: HashMap<Uuid, Training>,
    cards: HashMap<Uuid, EnrollmentCard>,
    // verification_code -> card id
    codes: HashMap<String, Uuid>,
}

/// Map-backed store with the same constraints as the Postgres schema:
/// unique codes, existing parents, cascading training deletes.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored cards
    pub async fn card_count(&self) -> usize {
        self.tables.read().await.cards.len()
    }
}

#[async_trait]
impl CardRepository for MemoryStore {
    async fn insert_card(&self, data: CreateCardData) -> Result<EnrollmentCard, RepositoryError> {
        let mut tables = self.tables.write().await;

        if !tables.trainings.contains_key(&data.training_id) {
            return Err(RepositoryError::MissingReference("training"));
        }
        if tables.codes.contains_key(&data.verification_code) {
            return Err(RepositoryError::DuplicateVerificationCode);
        }

        let now = Utc::now();
        let card = EnrollmentCard {
            id: Uuid::new_v4(),
            training_id: data.training_id,
            student_name: data.student_name,
            verification_code: data.verification_code,
            created_at: now,
            updated_at: now,
        };

        tables.codes.insert(card.verification_code.clone(), card.id);
        tables.cards.insert(card.id, card.clone());

        Ok(card)
    }

    async fn find_card_by_id(&self, id: Uuid) -> Result<Option<EnrollmentCard>, RepositoryError> {
        Ok(self.tables.read().await.cards.get(&id).cloned())
    }

    async fn find_card_by_code(
        &self,
        code: &str,
    ) -> Result<Option<EnrollmentCard>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .codes
            .get(code)
            .and_then(|id| tables.cards.get(id))
            .cloned())
    }

    async fn list_cards_by_training(
        &self,
        training_id: Uuid,
    ) -> Result<Vec<EnrollmentCard>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut cards: Vec<EnrollmentCard> = tables
            .cards
            .values()
            .filter(|c| c.training_id == training_id)
            .cloned()
            .collect();
        cards.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(cards)
    }

    async fn update_card_name(
        &self,
        id: Uuid,
        student_name: &str,
    ) -> Result<Option<EnrollmentCard>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.cards.get_mut(&id).map(|card| {
            card.student_name = student_name.to_string();
            card.updated_at = Utc::now();
            card.clone()
        }))
    }

    async fn delete_card(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        match tables.cards.remove(&id) {
            Some(card) => {
                tables.codes.remove(&card.verification_code);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl TrainingRepository for MemoryStore {
    async fn insert_company(&self, data: CreateCompanyData) -> Result<Company, RepositoryError> {
        let company = Company {
            id: Uuid::new_v4(),
            name: data.name,
            logo: data.logo,
            created_at: Utc::now(),
        };
        self.tables
            .write()
            .await
            .companies
            .insert(company.id, company.clone());
        Ok(company)
    }

    async fn find_company_by_id(&self, id: Uuid) -> Result<Option<Company>, RepositoryError> {
        Ok(self.tables.read().await.companies.get(&id).cloned())
    }

    async fn insert_training(
        &self,
        data: CreateTrainingData,
    ) -> Result<Training, RepositoryError> {
        let mut tables = self.tables.write().await;

        if !tables.companies.contains_key(&data.company_id) {
            return Err(RepositoryError::MissingReference("company"));
        }

        let now = Utc::now();
        let training = Training {
            id: Uuid::new_v4(),
            company_id: data.company_id,
            name: data.name,
            description: data.description,
            training_date: data.training_date,
            validity_date: data.validity_date,
            workload_hours: data.workload_hours,
            coordinator_name: data.coordinator_name,
            instructor_name: data.instructor_name,
            instructor_signature: data.instructor_signature,
            coordinator_signature: data.coordinator_signature,
            created_at: now,
            updated_at: now,
        };
        tables.trainings.insert(training.id, training.clone());

        Ok(training)
    }

    async fn find_training_by_id(&self, id: Uuid) -> Result<Option<Training>, RepositoryError> {
        Ok(self.tables.read().await.trainings.get(&id).cloned())
    }

    async fn list_trainings(&self) -> Result<Vec<Training>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut trainings: Vec<Training> = tables.trainings.values().cloned().collect();
        trainings.sort_by(|a, b| {
            b.training_date
                .cmp(&a.training_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(trainings)
    }

    async fn update_training(
        &self,
        id: Uuid,
        data: UpdateTrainingData,
    ) -> Result<Option<Training>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.trainings.get_mut(&id).map(|training| {
            training.name = data.name;
            training.description = data.description;
            training.training_date = data.training_date;
            training.validity_date = data.validity_date;
            training.workload_hours = data.workload_hours;
            training.coordinator_name = data.coordinator_name;
            training.instructor_name = data.instructor_name;
            training.instructor_signature = data.instructor_signature;
            training.coordinator_signature = data.coordinator_signature;
            training.updated_at = Utc::now();
            training.clone()
        }))
    }

    async fn delete_training(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.trainings.remove(&id).is_none() {
            return Ok(false);
        }

        let orphaned: Vec<EnrollmentCard> = tables
            .cards
            .values()
            .filter(|c| c.training_id == id)
            .cloned()
            .collect();
        for card in orphaned {
            tables.cards.remove(&card.id);
            tables.codes.remove(&card.verification_code);
        }

        Ok(true)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
