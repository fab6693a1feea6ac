use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::error;

use crate::quota::QuotaError;
use crate::wallet::WalletError;

use super::types::{
    AwardRequest, CreatePromoRequest, ErrorResponse, IncrementImageGenRequest,
    IncrementMessageRequest, LimitsResponse, PromoResponse, QuotaDecisionResponse,
    ResetCheckRequest, ResetCheckResponse, SpendRequest, UpgradeRequest, UpgradeResponse,
    WalletResponse,
};
use super::ApiState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

pub async fn increment_message(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<IncrementMessageRequest>,
) -> ApiResult<QuotaDecisionResponse> {
    validate_user_id(&request.user_id)?;

    match state
        .quota
        .increment_message_usage(&request.user_id, request.has_image)
    {
        Ok(usage) => Ok(Json(QuotaDecisionResponse::allowed(usage))),
        Err(err) => quota_refusal_or_fault(err),
    }
}

pub async fn increment_image_gen(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<IncrementImageGenRequest>,
) -> ApiResult<QuotaDecisionResponse> {
    validate_user_id(&request.user_id)?;

    match state.quota.increment_image_gen_usage(&request.user_id) {
        Ok(usage) => Ok(Json(QuotaDecisionResponse::allowed(usage))),
        Err(err) => quota_refusal_or_fault(err),
    }
}

pub async fn reset_check(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ResetCheckRequest>,
) -> ApiResult<ResetCheckResponse> {
    validate_user_id(&request.user_id)?;

    let outcome = state
        .quota
        .check_and_reset_usage(&request.user_id)
        .map_err(internal_error)?;
    Ok(Json(outcome.into()))
}

pub async fn get_limits(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<String>,
) -> ApiResult<LimitsResponse> {
    let usage = state
        .quota
        .get_user_limits(&user_id)
        .map_err(internal_error)?;
    Ok(Json(LimitsResponse { usage }))
}

pub async fn get_wallet(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<String>,
) -> ApiResult<WalletResponse> {
    let wallet = state.wallet.balance(&user_id).map_err(wallet_error)?;
    Ok(Json(wallet.into()))
}

pub async fn award_coins(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<AwardRequest>,
) -> ApiResult<WalletResponse> {
    validate_user_id(&request.user_id)?;

    let source = request.source.as_deref().unwrap_or("unspecified");
    let wallet = state
        .wallet
        .award(&request.user_id, request.amount, source)
        .map_err(wallet_error)?;
    Ok(Json(wallet.into()))
}

pub async fn spend_coins(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SpendRequest>,
) -> ApiResult<WalletResponse> {
    validate_user_id(&request.user_id)?;

    let wallet = state
        .wallet
        .spend(&request.user_id, request.amount)
        .map_err(wallet_error)?;
    Ok(Json(wallet.into()))
}

pub async fn upgrade_tier(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<UpgradeRequest>,
) -> ApiResult<UpgradeResponse> {
    validate_user_id(&request.user_id)?;

    let outcome = state
        .wallet
        .upgrade_to_plus(&request.user_id, request.promo_code.as_deref())
        .map_err(wallet_error)?;
    Ok(Json(outcome.into()))
}

pub async fn create_promo(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreatePromoRequest>,
) -> ApiResult<PromoResponse> {
    let promo = state
        .wallet
        .create_promo(
            &request.code,
            request.discount_percent,
            request.max_uses,
            request.expires_at,
        )
        .map_err(wallet_error)?;
    Ok(Json(promo.into()))
}

pub async fn health_check() -> ApiResult<serde_json::Value> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": "quota-engine"
    })))
}

// Quota refusals ride a 200 with the structured verdict; only storage
// faults surface as a generic 500.
fn quota_refusal_or_fault(err: QuotaError) -> ApiResult<QuotaDecisionResponse> {
    match err.reason_code() {
        Some(reason) => Ok(Json(QuotaDecisionResponse::refused(reason, err.resets_at()))),
        None => Err(internal_error(err)),
    }
}

fn wallet_error(err: WalletError) -> (StatusCode, Json<ErrorResponse>) {
    match &err {
        WalletError::InvalidAmount(_) => bad_request("invalid_amount", &err.to_string()),
        WalletError::InvalidPromo(_) => bad_request("invalid_promo", &err.to_string()),
        WalletError::UnknownPromo(_) => not_found("unknown_promo", &err.to_string()),
        WalletError::InsufficientBalance { .. } => conflict("insufficient_balance", &err.to_string()),
        WalletError::AlreadyPlus(_) => conflict("already_plus", &err.to_string()),
        WalletError::PromoExhausted(_) => conflict("promo_exhausted", &err.to_string()),
        WalletError::PromoExpired(_) => conflict("promo_expired", &err.to_string()),
        WalletError::PromoExists(_) => conflict("promo_exists", &err.to_string()),
        WalletError::Storage(_) => internal_error(err),
    }
}

fn validate_user_id(user_id: &str) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if user_id.trim().is_empty() {
        return Err(bad_request("invalid_user_id", "user_id cannot be empty"));
    }
    Ok(())
}

fn bad_request(code: &str, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            details: None,
        }),
    )
}

fn not_found(code: &str, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            details: None,
        }),
    )
}

fn conflict(code: &str, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::CONFLICT,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            details: None,
        }),
    )
}

fn internal_error<E: std::fmt::Display>(err: E) -> (StatusCode, Json<ErrorResponse>) {
    error!(error = %err, "quota API internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "internal server error".to_string(),
            code: "internal_error".to_string(),
            details: Some(serde_json::json!({ "message": err.to_string() })),
        }),
    )
}
