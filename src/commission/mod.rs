/// 수수료 납부 증빙 처리
/// 1. 판매자의 증빙 제출(잔액 한도 내에서만)
/// 2. 관리자의 승인/반려
/// 승인된 증빙의 실제 정산은 scheduler::settlement가 수행한다.
// region:    --- Imports
use crate::database::DatabaseManager;
use crate::query::handlers;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
// endregion: --- Imports

// region:    --- Models

/// 수수료 납부 증빙
/// 상태 전이: PENDING -> APPROVED | REJECTED, APPROVED -> SETTLED
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct CommissionProof {
    pub id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub comment: Option<String>,
    pub proof_url: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// 정산 감사 기록
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct CommissionSettlement {
    pub id: i64,
    pub seller_id: i64,
    pub amount: i64,
    pub settled_at: DateTime<Utc>,
}

// endregion: --- Models

// region:    --- Commands

/// 증빙 제출 명령(이미지는 외부 이미지 호스트에 업로드된 URL만 받는다)
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProofCommand {
    pub amount: i64,
    pub comment: Option<String>,
    pub proof_url: String,
}

/// 증빙 상태 변경 명령(관리자)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReviewProofCommand {
    pub status: String,
}

/// 1. 증빙 제출
pub async fn handle_submit_proof(
    cmd: SubmitProofCommand,
    user_id: i64,
    db_manager: &DatabaseManager,
) -> Result<CommissionProof, serde_json::Value> {
    info!(
        "{:<12} --> 수수료 증빙 제출 처리 시작: user={}, amount={}",
        "Command", user_id, cmd.amount
    );

    if cmd.amount <= 0 {
        return Err(serde_json::json!({
            "error": "납부 금액이 올바르지 않습니다.",
            "code": "INVALID_AMOUNT"
        }));
    }

    let user = handlers::get_user(db_manager, user_id)
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?
        .ok_or_else(|| {
            serde_json::json!({"error": "사용자를 찾을 수 없습니다.", "code": "USER_NOT_FOUND"})
        })?;

    if user.unpaid_commission == 0 {
        return Err(serde_json::json!({
            "error": "납부할 수수료가 없습니다.",
            "code": "NO_COMMISSION_DUE"
        }));
    }
    if cmd.amount > user.unpaid_commission {
        return Err(serde_json::json!({
            "error": "납부 금액이 미납 수수료를 초과합니다.",
            "code": "EXCEEDS_BALANCE",
            "unpaid_commission": user.unpaid_commission
        }));
    }

    let proof = sqlx::query_as::<_, CommissionProof>(
        "INSERT INTO commission_proofs (user_id, amount, comment, proof_url, status, created_at)
         VALUES ($1, $2, $3, $4, 'PENDING', $5)
         RETURNING *",
    )
    .bind(user_id)
    .bind(cmd.amount)
    .bind(&cmd.comment)
    .bind(&cmd.proof_url)
    .bind(Utc::now())
    .fetch_one(db_manager.pool())
    .await
    .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?;

    info!("{:<12} --> 수수료 증빙 제출 성공: id={}", "Command", proof.id);
    Ok(proof)
}

/// 2. 증빙 승인/반려(관리자)
/// PENDING 상태의 증빙만 전이할 수 있다.
pub async fn handle_review_proof(
    proof_id: i64,
    cmd: ReviewProofCommand,
    db_manager: &DatabaseManager,
) -> Result<CommissionProof, serde_json::Value> {
    info!(
        "{:<12} --> 수수료 증빙 심사 처리 시작: id={}, status={}",
        "Command", proof_id, cmd.status
    );

    if cmd.status != "APPROVED" && cmd.status != "REJECTED" {
        return Err(serde_json::json!({
            "error": "허용되지 않는 증빙 상태입니다.",
            "code": "INVALID_STATUS"
        }));
    }

    let existing = sqlx::query_as::<_, CommissionProof>(
        "SELECT * FROM commission_proofs WHERE id = $1",
    )
    .bind(proof_id)
    .fetch_optional(db_manager.pool())
    .await
    .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?
    .ok_or_else(|| {
        serde_json::json!({"error": "증빙을 찾을 수 없습니다.", "code": "NOT_FOUND"})
    })?;

    if existing.status != "PENDING" {
        return Err(serde_json::json!({
            "error": "대기 상태의 증빙만 심사할 수 있습니다.",
            "code": "INVALID_TRANSITION",
            "status": existing.status
        }));
    }

    // 조건부 업데이트: 심사가 겹쳐도 한 번만 전이된다
    let updated = sqlx::query_as::<_, CommissionProof>(
        "UPDATE commission_proofs SET status = $1 WHERE id = $2 AND status = 'PENDING' RETURNING *",
    )
    .bind(&cmd.status)
    .bind(proof_id)
    .fetch_optional(db_manager.pool())
    .await
    .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?
    .ok_or_else(|| {
        serde_json::json!({
            "error": "대기 상태의 증빙만 심사할 수 있습니다.",
            "code": "INVALID_TRANSITION"
        })
    })?;

    info!(
        "{:<12} --> 수수료 증빙 심사 완료: id={}, status={}",
        "Command", updated.id, updated.status
    );
    Ok(updated)
}

// endregion: --- Commands
