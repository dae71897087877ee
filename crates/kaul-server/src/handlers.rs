//! HTTP request handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use kaul_core::service::VOTE_RECORDED_MESSAGE;
use kaul_core::{DistributionReport, Listing, Subject, SubjectId, UserAccount, UserId, VoteType};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Body of `POST /vote`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    /// Subject to vote on.
    pub id: SubjectId,
    /// `up` or `down`.
    pub vote_type: String,
    /// Voter.
    pub user_id: UserId,
}

/// Body of a successful `POST /vote`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    /// Always `true`.
    pub success: bool,
    /// Subjects after the vote.
    pub subjects: Vec<Subject>,
    /// The voter's account after the vote.
    pub user: UserAccount,
    /// Human-readable confirmation.
    pub message: String,
    /// Rewards paid by this vote.
    pub rewards: DistributionReport,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status message.
    pub status: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
}

/// Handle GET /health.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.uptime_secs(),
    })
}

/// Handle GET /subjects - all subjects, accounts and profiles.
pub async fn list_subjects(State(state): State<Arc<AppState>>) -> ApiResult<Json<Listing>> {
    let service = Arc::clone(state.service()).lock_owned().await;
    let listing = tokio::task::spawn_blocking(move || service.list())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::Listing)?;
    Ok(Json(listing))
}

/// Handle POST /vote.
pub async fn record_vote(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> ApiResult<Json<VoteResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let vote_type: VoteType = request.vote_type.parse().map_err(ApiError::Vote)?;

    let service = Arc::clone(state.service()).lock_owned().await;
    let outcome = tokio::task::spawn_blocking(move || {
        service.record_vote(request.id, vote_type, &request.user_id)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
    .map_err(ApiError::Vote)?;

    Ok(Json(VoteResponse {
        success: true,
        subjects: outcome.subjects,
        user: outcome.user,
        message: VOTE_RECORDED_MESSAGE.to_string(),
        rewards: outcome.report,
    }))
}
