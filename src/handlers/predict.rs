use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Response},
    http::{StatusCode, header},
};
use crate::errors::{AppError, AppResult};
use crate::models::PredictionTable;
use crate::services::Upload;
use crate::AppState;
use super::views::{self, Notice, UploadOutcome};

const COUNT_WARNING: &str = "Please upload exactly 3 files: Bundle 1, Bundle 2, and Traffic.";

// Collects every file part in form order. Empty file inputs are skipped.
async fn collect_uploads(multipart: &mut Multipart) -> AppResult<Vec<Upload>> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to get next field from multipart form: {}", e);
        AppError::Upload(format!("Failed to process form field: {}", e))
    })? {
        let filename = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                tracing::debug!("Skipping non-file field: {:?}", field.name());
                continue;
            }
        };

        let data = field.bytes().await.map_err(|e| {
            tracing::error!("Failed to read upload {}: {}", filename, e);
            AppError::Upload(format!("Failed to read {}: {}", filename, e))
        })?;

        tracing::debug!("Received {} ({} bytes)", filename, data.len());
        uploads.push(Upload { filename, data });
    }

    Ok(uploads)
}

async fn run_prediction(state: &AppState, mut multipart: Multipart) -> AppResult<PredictionTable> {
    let uploads = collect_uploads(&mut multipart).await?;
    state.predictor.predict(uploads).await
}

/// Upload view submit: renders the result table, a count warning or a single error line.
pub async fn process_predictions(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Response> {
    let templates = &state.config.ui.templates_dir;
    let notice = Notice::default();

    let html = match run_prediction(&state, multipart).await {
        Ok(table) => views::render_upload(templates, &notice, UploadOutcome::Results(&table))?,
        Err(AppError::InputCount { received, .. }) => {
            tracing::info!("Prediction skipped, {} files uploaded", received);
            views::render_upload(templates, &notice, UploadOutcome::Warning(COUNT_WARNING))?
        }
        Err(AppError::Prediction(e)) => {
            tracing::error!("Prediction failed: {}", e);
            views::render_upload(
                templates,
                &notice,
                UploadOutcome::Failed(format!("Error during prediction: {}", e)),
            )?
        }
        Err(AppError::Upload(e)) => {
            tracing::warn!("Unreadable upload: {}", e);
            views::render_upload(
                templates,
                &notice,
                UploadOutcome::Failed(format!("Error reading upload: {}", e)),
            )?
        }
        Err(AppError::TaskPanic(e)) => {
            tracing::error!("Prediction task panicked: {}", e);
            views::render_upload(
                templates,
                &notice,
                UploadOutcome::Failed("Error during prediction: internal failure".into()),
            )?
        }
        Err(e) => return Err(e),
    };

    Ok(html.into_response())
}

/// Same pipeline, answered with the CSV file itself.
pub async fn download_predictions(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Response> {
    let table = run_prediction(&state, multipart).await?;
    let csv = table.to_csv()?;

    tracing::info!("Sending predictions.csv ({} rows, {} bytes)", table.len(), csv.len());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"predictions.csv\""),
        ],
        csv,
    )
        .into_response())
}
