use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::middleware::state::AppState;
use crate::error::{AppError, Result};
use crate::models::card::EnrollmentCard;
use crate::services::qr_generator;

/// Card as returned to operators, with its public verification URL
#[derive(Debug, Serialize)]
pub struct CardResponse {
    #[serde(flatten)]
    pub card: EnrollmentCard,
    pub verification_url: String,
}

impl CardResponse {
    pub fn new(card: EnrollmentCard, base_url: &str) -> Self {
        let verification_url = qr_generator::verification_url(base_url, &card.verification_code);
        Self {
            card,
            verification_url,
        }
    }
}

#[derive(Serialize)]
struct CardDetailResponse {
    #[serde(flatten)]
    card: CardResponse,
    qr_code: String, // PNG data URI
}

#[derive(Deserialize)]
struct RenameCardRequest {
    student_name: String,
}

async fn find_card(state: &AppState, card_id: Uuid) -> Result<EnrollmentCard> {
    state
        .store
        .find_card_by_id(card_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Card not found".to_string()))
}

async fn show_card(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<CardDetailResponse>> {
    let card = find_card(&state, card_id).await?;

    let qr_code =
        qr_generator::verification_qr_data_uri(&state.config.base_url, &card.verification_code)?;

    Ok(Json(CardDetailResponse {
        card: CardResponse::new(card, &state.config.base_url),
        qr_code,
    }))
}

async fn rename_card(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
    Json(body): Json<RenameCardRequest>,
) -> Result<Json<CardResponse>> {
    let card = state.issuer.update_name(card_id, &body.student_name).await?;

    Ok(Json(CardResponse::new(card, &state.config.base_url)))
}

async fn delete_card(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.issuer.remove_card(card_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PNG QR code pointing at the card's public verification page
async fn card_qr(State(state): State<AppState>, Path(card_id): Path<Uuid>) -> Result<Response> {
    let card = find_card(&state, card_id).await?;

    let url = qr_generator::verification_url(&state.config.base_url, &card.verification_code);
    let png = qr_generator::generate_qr_png(&url)?;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], png).into_response())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/cards/:id",
            get(show_card).patch(rename_card).delete(delete_card),
        )
        .route("/cards/:id/qr", get(card_qr))
}
