/// 수수료 정산 작업
/// 관리자가 승인한 납부 증빙을 판매자 미납 잔액에서 차감하고
/// 감사용 정산 기록을 남긴다.
// region:    --- Imports
use crate::bidding::model::User;
use crate::commission::CommissionProof;
use crate::notifier::Notifier;
use crate::query::queries;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

// region:    --- Settlement Job

/// 차감 후 잔액 계산
/// 증빙 금액이 실제 잔액을 초과해도 0 아래로 내려가지 않는다.
pub fn settled_balance(balance: i64, claim: i64) -> i64 {
    (balance - claim).max(0)
}

/// 승인된 증빙 일괄 정산
/// 개별 증빙의 실패는 로그만 남기고 나머지 증빙 처리를 계속한다.
pub async fn settle_approved_proofs(
    pool: &PgPool,
    notifier: &dyn Notifier,
) -> Result<(), sqlx::Error> {
    let proofs = sqlx::query_as::<_, CommissionProof>(queries::GET_APPROVED_PROOFS)
        .fetch_all(pool)
        .await?;

    for proof in proofs {
        if let Err(e) = settle_proof(pool, notifier, &proof).await {
            error!(
                "{:<12} --> 수수료 정산 실패: proof={}, {:?}",
                "Settle", proof.id, e
            );
        }
    }
    Ok(())
}

/// 증빙 한 건 정산
async fn settle_proof(
    pool: &PgPool,
    notifier: &dyn Notifier,
    proof: &CommissionProof,
) -> Result<(), sqlx::Error> {
    // 트랜잭션 시작
    let mut tx = pool.begin().await?;

    // 증빙 선점: 겹쳐 실행된 작업 인스턴스 중 하나만 통과한다
    let claimed = sqlx::query(
        "UPDATE commission_proofs SET status = 'SETTLED'
         WHERE id = $1 AND status = 'APPROVED'
         RETURNING id",
    )
    .bind(proof.id)
    .fetch_optional(&mut *tx)
    .await?;

    if claimed.is_none() {
        tx.rollback().await?;
        debug!("{:<12} --> 이미 정산된 증빙: id={}", "Settle", proof.id);
        return Ok(());
    }

    // 판매자 행 잠금 조회
    let seller = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
        .bind(proof.user_id)
        .fetch_optional(&mut *tx)
        .await?;

    let Some(seller) = seller else {
        tx.rollback().await?;
        warn!(
            "{:<12} --> 판매자를 찾을 수 없어 건너뜀: proof={}, seller={}",
            "Settle", proof.id, proof.user_id
        );
        return Ok(());
    };

    let new_balance = settled_balance(seller.unpaid_commission, proof.amount);

    sqlx::query("UPDATE users SET unpaid_commission = $1 WHERE id = $2")
        .bind(new_balance)
        .bind(seller.id)
        .execute(&mut *tx)
        .await?;

    // 감사용 정산 기록
    sqlx::query(
        "INSERT INTO commission_settlements (seller_id, amount, settled_at) VALUES ($1, $2, $3)",
    )
    .bind(seller.id)
    .bind(proof.amount)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    // 트랜잭션 커밋
    tx.commit().await?;
    info!(
        "{:<12} --> 수수료 정산 완료: proof={}, seller={}, 차감={}, 잔액={}",
        "Settle", proof.id, seller.id, proof.amount, new_balance
    );

    // 판매자 알림(실패는 로그만, 재시도 없음)
    let body = format!(
        "{}님, 납부하신 수수료 {}원이 정산되었습니다. 남은 미납 수수료는 {}원입니다.",
        seller.username, proof.amount, new_balance
    );
    if let Err(e) = notifier
        .send(&seller.email, "수수료 정산 완료", &body)
        .await
    {
        error!(
            "{:<12} --> 정산 알림 발송 실패: proof={}, {:?}",
            "Settle", proof.id, e
        );
    }

    Ok(())
}

// endregion: --- Settlement Job

// endregion: --- Tests
