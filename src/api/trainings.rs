use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::cards::CardResponse;
use crate::api::middleware::state::AppState;
use crate::error::{AppError, Result};
use crate::models::{company::Company, training::Training};
use crate::services::card_issuer::{EnrollmentCardDraft, Gender};
use crate::services::images;
use crate::services::training_registry::{self, TrainingDraft, TrainingOverview, TrainingPatch};

#[derive(Deserialize)]
struct CreateCompanyRequest {
    name: String,
    /// Base64 PNG or PNG data URI
    logo: Option<String>,
}

#[derive(Deserialize)]
struct CreateTrainingRequest {
    company_id: Option<Uuid>,
    name: Option<String>,
    description: Option<String>,
    training_date: Option<NaiveDate>,
    validity_date: Option<NaiveDate>,
    workload_hours: Option<f64>,
    coordinator_name: Option<String>,
    instructor_name: Option<String>,
    instructor_signature: Option<String>,
    coordinator_signature: Option<String>,
}

#[derive(Deserialize)]
struct UpdateTrainingRequest {
    name: Option<String>,
    description: Option<String>,
    training_date: Option<NaiveDate>,
    validity_date: Option<NaiveDate>,
    workload_hours: Option<f64>,
    coordinator_name: Option<String>,
    instructor_name: Option<String>,
    instructor_signature: Option<String>,
    coordinator_signature: Option<String>,
}

#[derive(Deserialize)]
struct EnrollRequest {
    student_name: Option<String>,
    student_gender: Option<Gender>,
    verification_code: Option<String>,
}

#[derive(Serialize)]
struct TrainingDetailResponse {
    #[serde(flatten)]
    training: Training,
    company: Company,
    student_count: usize,
    cards: Vec<CardResponse>,
    instructor_signature: String,
    coordinator_signature: String,
    company_logo: String,
}

impl TrainingDetailResponse {
    fn from_overview(overview: TrainingOverview, base_url: &str) -> Self {
        let student_count = overview.student_count();
        Self {
            instructor_signature: images::optional_png_data_uri(
                overview.training.instructor_signature.as_deref(),
            ),
            coordinator_signature: images::optional_png_data_uri(
                overview.training.coordinator_signature.as_deref(),
            ),
            company_logo: images::optional_png_data_uri(overview.company.logo.as_deref()),
            cards: overview
                .cards
                .into_iter()
                .map(|card| CardResponse::new(card, base_url))
                .collect(),
            student_count,
            training: overview.training,
            company: overview.company,
        }
    }
}

fn decode_image(field: &str, encoded: Option<String>) -> Result<Option<Vec<u8>>> {
    encoded
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            images::decode_uploaded_image(&s)
                .map_err(|_| AppError::Validation(format!("{} is not valid base64", field)))
        })
        .transpose()
}

/// Register a company
async fn create_company(
    State(state): State<AppState>,
    Json(body): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<Company>)> {
    let logo = decode_image("logo", body.logo)?;
    let company = training_registry::register_company(&*state.store, &body.name, logo).await?;

    Ok((StatusCode::CREATED, Json(company)))
}

/// List all trainings
async fn list_trainings(State(state): State<AppState>) -> Result<Json<Vec<Training>>> {
    let trainings = state.store.list_trainings().await?;
    Ok(Json(trainings))
}

/// Register a training
async fn create_training(
    State(state): State<AppState>,
    Json(body): Json<CreateTrainingRequest>,
) -> Result<(StatusCode, Json<Training>)> {
    let draft = TrainingDraft {
        company_id: body.company_id,
        name: body.name,
        description: body.description,
        training_date: body.training_date,
        validity_date: body.validity_date,
        workload_hours: body.workload_hours,
        coordinator_name: body.coordinator_name,
        instructor_name: body.instructor_name,
        instructor_signature: decode_image("instructor_signature", body.instructor_signature)?,
        coordinator_signature: decode_image("coordinator_signature", body.coordinator_signature)?,
    };

    let training = training_registry::register_training(&*state.store, draft).await?;

    Ok((StatusCode::CREATED, Json(training)))
}

/// Training with its company and enrolled cards
async fn show_training(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TrainingDetailResponse>> {
    let overview = training_registry::training_overview(&*state.store, id).await?;

    Ok(Json(TrainingDetailResponse::from_overview(
        overview,
        &state.config.base_url,
    )))
}

/// Edit a training in place. Issued cards keep their codes.
async fn update_training(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTrainingRequest>,
) -> Result<Json<Training>> {
    let patch = TrainingPatch {
        name: body.name,
        description: body.description,
        training_date: body.training_date,
        validity_date: body.validity_date,
        workload_hours: body.workload_hours,
        coordinator_name: body.coordinator_name,
        instructor_name: body.instructor_name,
        instructor_signature: decode_image("instructor_signature", body.instructor_signature)?,
        coordinator_signature: decode_image("coordinator_signature", body.coordinator_signature)?,
    };

    let training = training_registry::update_training(&*state.store, id, patch).await?;

    Ok(Json(training))
}

/// Delete a training and its cards
async fn delete_training(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    training_registry::remove_training(&*state.store, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Enroll a student, issuing a card with a fresh verification code
async fn enroll_student(
    State(state): State<AppState>,
    Path(training_id): Path<Uuid>,
    Json(body): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<CardResponse>)> {
    let card = state
        .issuer
        .issue_on_create(EnrollmentCardDraft {
            training_id: Some(training_id),
            student_name: body.student_name,
            verification_code: body.verification_code,
            student_gender: body.student_gender,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CardResponse::new(card, &state.config.base_url)),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/companies", post(create_company))
        .route("/trainings", get(list_trainings).post(create_training))
        .route(
            "/trainings/:id",
            get(show_training)
                .patch(update_training)
                .delete(delete_training),
        )
        .route("/trainings/:id/cards", post(enroll_student))
}
