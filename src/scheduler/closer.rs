/// 경매 종료 정산 작업
/// 종료 시각이 지났지만 아직 정산되지 않은 경매를 찾아
/// 낙찰자를 확정하고 판매자 수수료를 적립한다.
/// commission_calculated 플래그의 조건부 선점이 멱등성 경계다.
// region:    --- Imports
use crate::bidding::model::{Auction, Bid, User};
use crate::notifier::Notifier;
use crate::query::queries;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Commission

// 플랫폼 수수료율(낙찰가 대비 %)
pub const COMMISSION_RATE_PERCENT: i64 = 1;

/// 낙찰가에 대한 수수료 계산(정수 내림)
pub fn commission_for(amount: i64) -> i64 {
    amount * COMMISSION_RATE_PERCENT / 100
}

// endregion: --- Commission

// region:    --- Auction Closer Job

/// 종료된 경매 일괄 정산
/// 개별 경매의 실패는 로그만 남기고 나머지 경매 처리를 계속한다.
pub async fn close_ended_auctions(
    pool: &PgPool,
    notifier: &dyn Notifier,
) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    let ended = sqlx::query_as::<_, Auction>(queries::GET_ENDED_UNSETTLED_AUCTIONS)
        .bind(now)
        .fetch_all(pool)
        .await?;

    for auction in ended {
        if let Err(e) = settle_auction(pool, notifier, &auction).await {
            error!(
                "{:<12} --> 경매 정산 실패: id={}, {:?}",
                "Closer", auction.id, e
            );
        }
    }
    Ok(())
}

/// 경매 한 건 정산
/// 플래그 선점과 통계/수수료 반영이 한 트랜잭션으로 커밋되고,
/// 낙찰자 알림은 커밋 이후 최선 노력으로만 시도한다.
async fn settle_auction(
    pool: &PgPool,
    notifier: &dyn Notifier,
    auction: &Auction,
) -> Result<(), sqlx::Error> {
    // 트랜잭션 시작
    let mut tx = pool.begin().await?;

    // 정산 플래그 선점: 겹쳐 실행된 작업 인스턴스 중 하나만 통과하고,
    // 행 잠금이 커밋 전까지 늦게 도착한 입찰을 막는다
    let claimed = sqlx::query(
        "UPDATE auctions
         SET commission_calculated = TRUE, status = 'COMPLETED'
         WHERE id = $1 AND commission_calculated = FALSE
         RETURNING id",
    )
    .bind(auction.id)
    .fetch_optional(&mut *tx)
    .await?;

    if claimed.is_none() {
        tx.rollback().await?;
        debug!(
            "{:<12} --> 이미 정산된 경매: id={}",
            "Closer", auction.id
        );
        return Ok(());
    }

    // 최고 입찰 조회(동액이면 먼저 제출한 입찰이 낙찰)
    let top_bid = sqlx::query_as::<_, Bid>(queries::GET_TOP_BID)
        .bind(auction.id)
        .fetch_optional(&mut *tx)
        .await?;

    // 유찰: 플래그만 남기고 종료
    let Some(bid) = top_bid else {
        tx.commit().await?;
        info!(
            "{:<12} --> 유찰 처리 완료(입찰 없음): id={}",
            "Closer", auction.id
        );
        return Ok(());
    };

    let commission = commission_for(bid.amount);

    // 낙찰자 확정
    sqlx::query("UPDATE auctions SET highest_bidder = $1 WHERE id = $2")
        .bind(bid.bidder_id)
        .bind(auction.id)
        .execute(&mut *tx)
        .await?;

    // 낙찰자 통계 반영
    sqlx::query(
        "UPDATE users SET money_spent = money_spent + $1, auctions_won = auctions_won + 1
         WHERE id = $2",
    )
    .bind(bid.amount)
    .bind(bid.bidder_id)
    .execute(&mut *tx)
    .await?;

    // 판매자 미납 수수료 적립
    sqlx::query("UPDATE users SET unpaid_commission = unpaid_commission + $1 WHERE id = $2")
        .bind(commission)
        .bind(auction.created_by)
        .execute(&mut *tx)
        .await?;

    // 트랜잭션 커밋
    tx.commit().await?;
    info!(
        "{:<12} --> 경매 정산 완료: id={}, 낙찰자={}, 낙찰가={}, 수수료={}",
        "Closer", auction.id, bid.bidder_id, bid.amount, commission
    );

    // 낙찰자 알림(실패는 로그만, 재시도 없음)
    let winner = sqlx::query_as::<_, User>(queries::GET_USER)
        .bind(bid.bidder_id)
        .fetch_optional(pool)
        .await?;
    let seller = sqlx::query_as::<_, User>(queries::GET_USER)
        .bind(auction.created_by)
        .fetch_optional(pool)
        .await?;

    if let (Some(winner), Some(seller)) = (winner, seller) {
        let subject = format!("낙찰 안내: {}", auction.title);
        let body = format!(
            "{}님, '{}' 경매에 {}원으로 낙찰되었습니다. 판매자 {}({})에게 연락하여 결제를 진행해 주세요.",
            winner.username, auction.title, bid.amount, seller.username, seller.email
        );
        if let Err(e) = notifier.send(&winner.email, &subject, &body).await {
            error!(
                "{:<12} --> 낙찰 알림 발송 실패: auction={}, {:?}",
                "Closer", auction.id, e
            );
        }
    }

    Ok(())
}

// endregion: --- Auction Closer Job

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commission_is_one_percent() {
        assert_eq!(commission_for(20000), 200);
        assert_eq!(commission_for(100), 1);
        assert_eq!(commission_for(1_000_000), 10_000);
    }

    #[test]
    fn test_commission_floors_small_amounts() {
        assert_eq!(commission_for(99), 0);
        assert_eq!(commission_for(0), 0);
    }
}
// endregion: --- Tests
