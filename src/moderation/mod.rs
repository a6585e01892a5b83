/// 경매 신고 처리
/// 1. 사용자의 신고 접수
/// 2. 관리자의 상태 변경(자동 제재와 별개인 수동 경로)
/// 24시간 내 동일 사유 누적에 따른 자동 삭제는 scheduler::enforcement가 수행한다.
// region:    --- Imports
use crate::database::DatabaseManager;
use crate::query::handlers;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
// endregion: --- Imports

// region:    --- Models

/// 신고
/// 상태 전이: PENDING -> REVIEWED | RESOLVED
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Report {
    pub id: i64,
    pub auction_id: i64,
    pub reported_by: i64,
    pub reason: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// (경매, 사유)별 신고 집계 행
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct ReportGroup {
    pub auction_id: i64,
    pub reason: String,
    pub report_count: i64,
}

// endregion: --- Models

// region:    --- Commands

/// 신고 접수 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReportCommand {
    pub auction_id: i64,
    pub reason: String,
    pub description: Option<String>,
}

/// 신고 상태 변경 명령(관리자)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReviewReportCommand {
    pub status: String,
}

/// 1. 신고 접수
pub async fn handle_submit_report(
    cmd: SubmitReportCommand,
    reporter_id: i64,
    db_manager: &DatabaseManager,
) -> Result<Report, serde_json::Value> {
    info!(
        "{:<12} --> 신고 접수 처리 시작: auction={}, reporter={}, reason={:?}",
        "Command", cmd.auction_id, reporter_id, cmd.reason
    );

    if cmd.reason.trim().is_empty() {
        return Err(serde_json::json!({
            "error": "신고 사유가 없습니다.",
            "code": "INVALID_REASON"
        }));
    }

    handlers::get_auction(db_manager, cmd.auction_id)
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?
        .ok_or_else(|| {
            serde_json::json!({"error": "경매를 찾을 수 없습니다.", "code": "NOT_FOUND"})
        })?;

    let report = sqlx::query_as::<_, Report>(
        "INSERT INTO reports (auction_id, reported_by, reason, description, status, created_at)
         VALUES ($1, $2, $3, $4, 'PENDING', $5)
         RETURNING *",
    )
    .bind(cmd.auction_id)
    .bind(reporter_id)
    .bind(cmd.reason.trim())
    .bind(&cmd.description)
    .bind(Utc::now())
    .fetch_one(db_manager.pool())
    .await
    .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?;

    info!("{:<12} --> 신고 접수 성공: id={}", "Command", report.id);
    Ok(report)
}

/// 2. 신고 상태 변경(관리자)
pub async fn handle_review_report(
    report_id: i64,
    cmd: ReviewReportCommand,
    db_manager: &DatabaseManager,
) -> Result<Report, serde_json::Value> {
    info!(
        "{:<12} --> 신고 상태 변경 처리 시작: id={}, status={}",
        "Command", report_id, cmd.status
    );

    if cmd.status != "REVIEWED" && cmd.status != "RESOLVED" {
        return Err(serde_json::json!({
            "error": "허용되지 않는 신고 상태입니다.",
            "code": "INVALID_STATUS"
        }));
    }

    let report = sqlx::query_as::<_, Report>(
        "UPDATE reports SET status = $1 WHERE id = $2 RETURNING *",
    )
    .bind(&cmd.status)
    .bind(report_id)
    .fetch_optional(db_manager.pool())
    .await
    .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?
    .ok_or_else(|| {
        serde_json::json!({"error": "신고를 찾을 수 없습니다.", "code": "NOT_FOUND"})
    })?;

    info!(
        "{:<12} --> 신고 상태 변경 완료: id={}, status={}",
        "Command", report.id, report.status
    );
    Ok(report)
}

// endregion: --- Commands
