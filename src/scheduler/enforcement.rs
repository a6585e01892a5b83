/// 신고 제재 작업
/// 최근 24시간 동안 동일 (경매, 사유) 쌍에 신고가 임계값 이상 쌓이면
/// 해당 경매와 입찰을 삭제하고 그 경매의 모든 신고를 RESOLVED로 바꾼다.
/// 창은 매 틱마다 현재 시각 기준으로 다시 계산되는 이동 창이다.
// region:    --- Imports
use crate::bidding::model::{Auction, User};
use crate::moderation::ReportGroup;
use crate::notifier::Notifier;
use crate::query::queries;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Enforcement Job

// 자동 삭제 임계값(동일 사유 신고 수)
pub const REPORT_THRESHOLD: i64 = 10;

// 신고 집계 창(시간)
pub const REPORT_WINDOW_HOURS: i64 = 24;

/// 집계 창의 시작 시각
pub fn window_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(REPORT_WINDOW_HOURS)
}

/// 신고 수가 자동 삭제 임계값에 도달했는지 판정
pub fn meets_threshold(report_count: i64) -> bool {
    report_count >= REPORT_THRESHOLD
}

/// 임계값을 넘은 신고 그룹 일괄 제재
/// 개별 그룹의 실패는 로그만 남기고 나머지 그룹 처리를 계속한다.
pub async fn enforce_report_threshold(
    pool: &PgPool,
    notifier: &dyn Notifier,
) -> Result<(), sqlx::Error> {
    let cutoff = window_cutoff(Utc::now());
    let groups = sqlx::query_as::<_, ReportGroup>(queries::GET_REPORT_GROUPS_IN_WINDOW)
        .bind(cutoff)
        .fetch_all(pool)
        .await?;

    for group in groups.into_iter().filter(|g| meets_threshold(g.report_count)) {
        if let Err(e) = remove_reported_auction(pool, notifier, &group).await {
            error!(
                "{:<12} --> 신고 제재 실패: auction={}, reason={:?}, {:?}",
                "Enforce", group.auction_id, group.reason, e
            );
        }
    }
    Ok(())
}

/// 신고 누적 경매 한 건 제재
/// 해당 경매의 신고는 트리거된 사유와 무관하게 전부 RESOLVED 처리한다.
async fn remove_reported_auction(
    pool: &PgPool,
    notifier: &dyn Notifier,
    group: &ReportGroup,
) -> Result<(), sqlx::Error> {
    // 이미 삭제된 경매면 건너뜀
    let auction = sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
        .bind(group.auction_id)
        .fetch_optional(pool)
        .await?;
    let Some(auction) = auction else {
        debug!(
            "{:<12} --> 이미 삭제된 경매: id={}",
            "Enforce", group.auction_id
        );
        return Ok(());
    };

    // 트랜잭션 시작
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM bids WHERE auction_id = $1")
        .bind(auction.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM auctions WHERE id = $1")
        .bind(auction.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE reports SET status = 'RESOLVED' WHERE auction_id = $1")
        .bind(auction.id)
        .execute(&mut *tx)
        .await?;

    // 트랜잭션 커밋
    tx.commit().await?;
    info!(
        "{:<12} --> 신고 누적으로 경매 삭제: id={}, reason={:?}, 신고 수={}",
        "Enforce", auction.id, group.reason, group.report_count
    );

    // 판매자 알림(실패는 로그만, 재시도 없음)
    let seller = sqlx::query_as::<_, User>(queries::GET_USER)
        .bind(auction.created_by)
        .fetch_optional(pool)
        .await?;
    if let Some(seller) = seller {
        let subject = format!("경매 삭제 안내: {}", auction.title);
        let body = format!(
            "{}님, '{}' 경매가 반복된 신고로 인해 삭제되었습니다. 자세한 내용은 고객센터로 문의해 주세요.",
            seller.username, auction.title
        );
        if let Err(e) = notifier.send(&seller.email, &subject, &body).await {
            error!(
                "{:<12} --> 삭제 알림 발송 실패: auction={}, {:?}",
                "Enforce", auction.id, e
            );
        }
    }

    Ok(())
}

// endregion: --- Enforcement Job

// endregion: --- Tests
