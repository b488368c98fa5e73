use askama::Template;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::Uri,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{NaiveDate, Utc};
use percent_encoding::percent_decode_str;

use crate::api::middleware::state::AppState;
use crate::error::AppError;
use crate::services::card_verifier::{self, VerificationResult};
use crate::services::images;

// Templates. Askama escapes every interpolated value.
#[derive(Template)]
#[template(path = "verification/valid.html")]
struct ValidCardTemplate {
    student_name: String,
    training_name: String,
    training_description: String,
    training_date: String,
    validity_date: String,
    workload_hours: String,
    instructor_name: String,
    coordinator_name: String,
    company_name: String,
    company_logo: String,
    code: String,
    is_expired: bool,
}

#[derive(Template)]
#[template(path = "verification/invalid.html")]
struct InvalidCardTemplate {
    code: String,
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 {
        format!("{:.0}", hours)
    } else {
        format!("{}", hours)
    }
}

fn lossy_last_segment(uri: &Uri) -> String {
    let raw = uri.path().rsplit('/').next().unwrap_or_default();
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Public authenticity check for a printed card.
///
/// Unknown codes render the "invalid" page with a 200, not an HTTP error.
async fn verify_carteira(
    State(state): State<AppState>,
    uri: Uri,
    code: Result<Path<String>, PathRejection>,
) -> Result<Response, AppError> {
    let code = match code {
        Ok(Path(code)) => code,
        Err(rejection) => {
            // Segment is not UTF-8 once decoded; no stored code can match it
            tracing::info!(result = "not_found", %rejection, "Undecodable verification code");
            let code = lossy_last_segment(&uri);
            return Ok(InvalidCardTemplate { code }.into_response());
        }
    };

    let result = card_verifier::resolve(&*state.store, &code).await?;

    let page = match result {
        VerificationResult::Found {
            card,
            training,
            company,
        } => ValidCardTemplate {
            student_name: card.student_name,
            training_name: training.name,
            training_description: training.description.unwrap_or_default(),
            training_date: format_date(training.training_date),
            validity_date: format_date(training.validity_date),
            workload_hours: format_hours(training.workload_hours),
            instructor_name: training.instructor_name,
            coordinator_name: training.coordinator_name,
            company_logo: images::optional_png_data_uri(company.logo.as_deref()),
            company_name: company.name,
            code: card.verification_code,
            is_expired: training.validity_date < Utc::now().date_naive(),
        }
        .into_response(),
        VerificationResult::NotFound { code } => InvalidCardTemplate { code }.into_response(),
    };

    Ok(page)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/carteira/verificar/:code", get(verify_carteira))
}
