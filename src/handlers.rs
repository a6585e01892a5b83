// region:    --- Imports
use crate::auth::AuthUser;
use crate::bidding::commands::{
    handle_create_auction as command_create_auction, handle_delete_auction as command_delete_auction,
    handle_place_bid as command_place_bid, handle_republish as command_republish,
    CreateAuctionCommand, PlaceBidCommand, RepublishCommand,
};
use crate::commission::{
    handle_review_proof as command_review_proof, handle_submit_proof as command_submit_proof,
    ReviewProofCommand, SubmitProofCommand,
};
use crate::database::DatabaseManager;
use crate::moderation::{
    handle_review_report as command_review_report, handle_submit_report as command_submit_report,
    ReviewReportCommand, SubmitReportCommand,
};
use crate::query;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Error Mapping

/// 커맨드 오류 JSON의 code 필드를 HTTP 상태로 변환
fn error_response(err: serde_json::Value) -> Response {
    let status = match err["code"].as_str() {
        Some("NOT_FOUND") | Some("USER_NOT_FOUND") => StatusCode::NOT_FOUND,
        Some("FORBIDDEN") => StatusCode::FORBIDDEN,
        Some("BID_CONFLICT") => StatusCode::CONFLICT,
        Some("INTERNAL") => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, Json(err)).into_response()
}

/// 관리자 전용 경로 보호
fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(serde_json::json!({
            "error": "관리자만 접근할 수 있습니다.",
            "code": "FORBIDDEN"
        })),
    )
        .into_response()
}

// endregion: --- Error Mapping

// region:    --- Auction Handlers

/// 경매 등록 요청 처리
pub async fn handle_create_auction(
    State(db_manager): State<Arc<DatabaseManager>>,
    user: AuthUser,
    Json(cmd): Json<CreateAuctionCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> 경매 등록 요청 처리 시작: {:?}", "Handler", cmd);
    match command_create_auction(cmd, user.id, &db_manager).await {
        Ok(auction) => (StatusCode::CREATED, Json(auction)).into_response(),
        Err(e) => error_response(e),
    }
}

/// 입찰 요청 처리
pub async fn handle_bid(
    State(db_manager): State<Arc<DatabaseManager>>,
    user: AuthUser,
    Path(auction_id): Path<i64>,
    Json(cmd): Json<PlaceBidCommand>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 입찰 요청 처리 시작: auction={}, {:?}",
        "Handler", auction_id, cmd
    );
    match command_place_bid(auction_id, user.id, cmd, &db_manager).await {
        Ok(bid) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "success": true,
                "message": "입찰이 성공적으로 처리되었습니다.",
                "currentBid": bid.amount
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// 경매 삭제 요청 처리
pub async fn handle_delete_auction(
    State(db_manager): State<Arc<DatabaseManager>>,
    user: AuthUser,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 경매 삭제 요청 처리 시작: id={}",
        "Handler", auction_id
    );
    match command_delete_auction(auction_id, user.id, &user.role, &db_manager).await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "경매가 삭제되었습니다."
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// 경매 재등록 요청 처리
pub async fn handle_republish_auction(
    State(db_manager): State<Arc<DatabaseManager>>,
    user: AuthUser,
    Path(auction_id): Path<i64>,
    Json(cmd): Json<RepublishCommand>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 경매 재등록 요청 처리 시작: id={}, {:?}",
        "Handler", auction_id, cmd
    );
    match command_republish(auction_id, user.id, cmd, &db_manager).await {
        Ok(auction) => Json(auction).into_response(),
        Err(e) => error_response(e),
    }
}

// endregion: --- Auction Handlers

// region:    --- Query Handlers

/// 모든 경매 조회
pub async fn handle_get_auctions(
    State(db_manager): State<Arc<DatabaseManager>>,
) -> impl IntoResponse {
    info!("{:<12} --> 모든 경매 조회", "HandlerQuery");
    match query::handlers::get_all_auctions(&db_manager).await {
        Ok(auctions) => Json(auctions).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// 경매 상세 조회(입찰 목록은 금액 내림차순)
pub async fn handle_get_auction(
    State(db_manager): State<Arc<DatabaseManager>>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 경매 상세 조회 id: {}", "HandlerQuery", auction_id);
    let auction = match query::handlers::get_auction(&db_manager, auction_id).await {
        Ok(Some(auction)) => auction,
        Ok(None) => {
            return error_response(serde_json::json!({
                "error": "경매를 찾을 수 없습니다.",
                "code": "NOT_FOUND"
            }))
        }
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };
    match query::handlers::get_auction_bids(&db_manager, auction_id).await {
        Ok(bids) => Json(serde_json::json!({
            "auction": auction,
            "bids": bids
        }))
        .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

// endregion: --- Query Handlers

// region:    --- Report Handlers

/// 신고 접수 요청 처리
pub async fn handle_report_auction(
    State(db_manager): State<Arc<DatabaseManager>>,
    user: AuthUser,
    Json(cmd): Json<SubmitReportCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> 신고 접수 요청 처리 시작: {:?}", "Handler", cmd);
    match command_submit_report(cmd, user.id, &db_manager).await {
        Ok(report) => (StatusCode::CREATED, Json(report)).into_response(),
        Err(e) => error_response(e),
    }
}

/// 신고 목록 조회(관리자)
pub async fn handle_get_reports(
    State(db_manager): State<Arc<DatabaseManager>>,
    user: AuthUser,
) -> impl IntoResponse {
    if !user.is_admin() {
        return forbidden();
    }
    info!("{:<12} --> 신고 목록 조회", "HandlerQuery");
    match query::handlers::get_all_reports(&db_manager).await {
        Ok(reports) => Json(reports).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// 신고 상태 변경 요청 처리(관리자)
pub async fn handle_review_report(
    State(db_manager): State<Arc<DatabaseManager>>,
    user: AuthUser,
    Path(report_id): Path<i64>,
    Json(cmd): Json<ReviewReportCommand>,
) -> impl IntoResponse {
    if !user.is_admin() {
        return forbidden();
    }
    info!(
        "{:<12} --> 신고 상태 변경 요청 처리 시작: id={}, {:?}",
        "Handler", report_id, cmd
    );
    match command_review_report(report_id, cmd, &db_manager).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(e),
    }
}

// endregion: --- Report Handlers

// region:    --- Commission Handlers

/// 수수료 증빙 제출 요청 처리
pub async fn handle_submit_proof(
    State(db_manager): State<Arc<DatabaseManager>>,
    user: AuthUser,
    Json(cmd): Json<SubmitProofCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> 수수료 증빙 제출 요청 처리 시작: {:?}", "Handler", cmd);
    match command_submit_proof(cmd, user.id, &db_manager).await {
        Ok(proof) => (StatusCode::CREATED, Json(proof)).into_response(),
        Err(e) => error_response(e),
    }
}

/// 수수료 증빙 목록 조회(관리자)
pub async fn handle_get_proofs(
    State(db_manager): State<Arc<DatabaseManager>>,
    user: AuthUser,
) -> impl IntoResponse {
    if !user.is_admin() {
        return forbidden();
    }
    info!("{:<12} --> 수수료 증빙 목록 조회", "HandlerQuery");
    match query::handlers::get_all_proofs(&db_manager).await {
        Ok(proofs) => Json(proofs).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// 수수료 증빙 심사 요청 처리(관리자)
pub async fn handle_review_proof(
    State(db_manager): State<Arc<DatabaseManager>>,
    user: AuthUser,
    Path(proof_id): Path<i64>,
    Json(cmd): Json<ReviewProofCommand>,
) -> impl IntoResponse {
    if !user.is_admin() {
        return forbidden();
    }
    info!(
        "{:<12} --> 수수료 증빙 심사 요청 처리 시작: id={}, {:?}",
        "Handler", proof_id, cmd
    );
    match command_review_proof(proof_id, cmd, &db_manager).await {
        Ok(proof) => Json(proof).into_response(),
        Err(e) => error_response(e),
    }
}

// endregion: --- Commission Handlers
