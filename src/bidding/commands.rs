/// 경매 관련 커맨드 처리
/// 1. 입찰
/// 2. 경매 등록 / 삭제 / 재등록
// region:    --- Imports
use crate::bidding::model::{Auction, Bid};
use crate::database::DatabaseManager;
use crate::query::handlers;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령(본문에는 금액만 실리고 입찰자는 인증 게이트웨이가 공급)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub amount: Option<i64>,
}

/// 경매 등록 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuctionCommand {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub starting_bid: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// 경매 재등록 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RepublishCommand {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

// 판매자당 동시 진행 가능한 경매 수
pub const MAX_OPEN_AUCTIONS: i64 = 3;

// endregion: --- Commands

// region:    --- Validation

/// 입찰 수락 가능 여부 검증(시간, 상태, 금액)
pub fn validate_bid(
    auction: &Auction,
    amount: i64,
    now: DateTime<Utc>,
) -> Result<(), serde_json::Value> {
    if now < auction.start_time || auction.status == "SCHEDULED" {
        return Err(serde_json::json!({
            "error": "경매가 아직 시작되지 않았습니다.",
            "code": "NOT_STARTED"
        }));
    }
    if auction.commission_calculated || auction.status == "COMPLETED" || now > auction.end_time {
        return Err(serde_json::json!({
            "error": "경매가 이미 종료되었습니다.",
            "code": "ALREADY_ENDED"
        }));
    }
    if amount <= auction.current_bid {
        return Err(serde_json::json!({
            "error": "입찰 금액이 현재 가격보다 낮습니다.",
            "code": "LOW_BID",
            "current_bid": auction.current_bid
        }));
    }
    if amount < auction.starting_bid {
        return Err(serde_json::json!({
            "error": "입찰 금액이 시작 가격보다 낮습니다.",
            "code": "BELOW_STARTING_BID",
            "starting_bid": auction.starting_bid
        }));
    }
    Ok(())
}

/// 경매 시작/종료 시간 검증(등록 및 재등록 공용)
pub fn validate_schedule(
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), serde_json::Value> {
    if start_time <= now {
        return Err(serde_json::json!({
            "error": "경매 시작 시간은 미래여야 합니다.",
            "code": "INVALID_TIME"
        }));
    }
    if start_time >= end_time {
        return Err(serde_json::json!({
            "error": "경매 종료 시간은 시작 시간 이후여야 합니다.",
            "code": "INVALID_TIME"
        }));
    }
    Ok(())
}

// endregion: --- Validation

// region:    --- Place Bid

/// 1. 입찰
/// 수락 판정은 커밋 시점의 조건부 업데이트가 최종 권위를 가진다.
/// 동일 입찰자의 재입찰은 기존 행의 금액을 갱신한다.
pub async fn handle_place_bid(
    auction_id: i64,
    bidder_id: i64,
    cmd: PlaceBidCommand,
    db_manager: &DatabaseManager,
) -> Result<Bid, serde_json::Value> {
    info!(
        "{:<12} --> 입찰 요청 처리 시작: auction={}, bidder={}, amount={:?}",
        "Command", auction_id, bidder_id, cmd.amount
    );

    let amount = match cmd.amount {
        Some(a) if a > 0 => a,
        _ => {
            return Err(serde_json::json!({
                "error": "입찰 금액이 없거나 올바르지 않습니다.",
                "code": "INVALID_AMOUNT"
            }))
        }
    };

    // 경매 조회
    let auction = handlers::get_auction(db_manager, auction_id)
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?
        .ok_or_else(|| {
            serde_json::json!({"error": "경매를 찾을 수 없습니다.", "code": "NOT_FOUND"})
        })?;

    // 입찰자 조회(표시용 이름/이미지 비정규화를 위해 필요)
    let bidder = handlers::get_user(db_manager, bidder_id)
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?
        .ok_or_else(|| {
            serde_json::json!({"error": "사용자를 찾을 수 없습니다.", "code": "USER_NOT_FOUND"})
        })?;

    let now = Utc::now();
    validate_bid(&auction, amount, now)?;

    // 트랜잭션 시작
    let mut tx = db_manager
        .pool()
        .begin()
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?;

    // 현재 가격 확인 및 업데이트(커밋 시점 기준의 원자적 비교)
    let updated = sqlx::query(
        "UPDATE auctions SET current_bid = $1, highest_bidder = $2
         WHERE id = $3 AND current_bid < $1 AND commission_calculated = FALSE
         RETURNING current_bid",
    )
    .bind(amount)
    .bind(bidder_id)
    .bind(auction_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?;

    if updated.is_none() {
        // 롤백: 다른 입찰이 먼저 커밋됨
        tx.rollback()
            .await
            .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?;
        warn!(
            "{:<12} --> 입찰 경합 패배: auction={}, bidder={}, amount={}",
            "Command", auction_id, bidder_id, amount
        );
        return Err(serde_json::json!({
            "error": "더 높은 입찰이 먼저 처리되었습니다. 다시 시도해 주세요.",
            "code": "BID_CONFLICT"
        }));
    }

    // 입찰 기록 추가(동일 입찰자면 금액 갱신)
    let bid = sqlx::query_as::<_, Bid>(
        "INSERT INTO bids (auction_id, bidder_id, amount, bidder_name, bidder_image, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $6)
         ON CONFLICT (auction_id, bidder_id)
         DO UPDATE SET amount = EXCLUDED.amount, updated_at = EXCLUDED.updated_at
         RETURNING *",
    )
    .bind(auction_id)
    .bind(bidder_id)
    .bind(amount)
    .bind(&bidder.username)
    .bind(&bidder.profile_image)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?;

    // 트랜잭션 커밋
    tx.commit()
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?;

    info!(
        "{:<12} --> 입찰 성공: auction={}, 현재 가격 {}",
        "Command", auction_id, amount
    );
    Ok(bid)
}

// endregion: --- Place Bid

// region:    --- Auction Lifecycle

/// 2-1. 경매 등록
pub async fn handle_create_auction(
    cmd: CreateAuctionCommand,
    seller_id: i64,
    db_manager: &DatabaseManager,
) -> Result<Auction, serde_json::Value> {
    info!(
        "{:<12} --> 경매 등록 요청 처리 시작: seller={}, title={:?}",
        "Command", seller_id, cmd.title
    );

    if cmd.starting_bid <= 0 {
        return Err(serde_json::json!({
            "error": "시작 가격이 올바르지 않습니다.",
            "code": "INVALID_AMOUNT"
        }));
    }

    let now = Utc::now();
    validate_schedule(cmd.start_time, cmd.end_time, now)?;

    // 판매자당 동시 진행 경매 수 제한
    let open_count = handlers::count_open_auctions(db_manager, seller_id, now)
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?;
    if open_count >= MAX_OPEN_AUCTIONS {
        return Err(serde_json::json!({
            "error": "동시에 진행할 수 있는 경매는 3건까지입니다.",
            "code": "ACTIVE_LIMIT"
        }));
    }

    let auction = sqlx::query_as::<_, Auction>(
        "INSERT INTO auctions
         (title, description, category, condition, starting_bid, current_bid,
          start_time, end_time, created_by, status, created_at)
         VALUES ($1, $2, $3, $4, $5, $5, $6, $7, $8, 'SCHEDULED', $9)
         RETURNING *",
    )
    .bind(&cmd.title)
    .bind(&cmd.description)
    .bind(&cmd.category)
    .bind(&cmd.condition)
    .bind(cmd.starting_bid)
    .bind(cmd.start_time)
    .bind(cmd.end_time)
    .bind(seller_id)
    .bind(now)
    .fetch_one(db_manager.pool())
    .await
    .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?;

    info!(
        "{:<12} --> 경매 등록 성공: id={}",
        "Command", auction.id
    );
    Ok(auction)
}

/// 2-2. 경매 삭제
/// 소유자는 입찰이 없는 경우에만, 관리자는 언제든 삭제할 수 있다.
pub async fn handle_delete_auction(
    auction_id: i64,
    user_id: i64,
    role: &str,
    db_manager: &DatabaseManager,
) -> Result<(), serde_json::Value> {
    info!(
        "{:<12} --> 경매 삭제 요청 처리 시작: auction={}, user={}",
        "Command", auction_id, user_id
    );

    let auction = handlers::get_auction(db_manager, auction_id)
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?
        .ok_or_else(|| {
            serde_json::json!({"error": "경매를 찾을 수 없습니다.", "code": "NOT_FOUND"})
        })?;

    let is_admin = role == "SUPERADMIN";
    if !is_admin && auction.created_by != user_id {
        return Err(serde_json::json!({
            "error": "본인의 경매만 삭제할 수 있습니다.",
            "code": "FORBIDDEN"
        }));
    }

    if !is_admin {
        let has_bids = handlers::has_bids(db_manager, auction_id)
            .await
            .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?;
        if has_bids {
            return Err(serde_json::json!({
                "error": "입찰이 존재하는 경매는 삭제할 수 없습니다.",
                "code": "HAS_BIDS"
            }));
        }
    }

    let mut tx = db_manager
        .pool()
        .begin()
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?;

    sqlx::query("DELETE FROM bids WHERE auction_id = $1")
        .bind(auction_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?;
    sqlx::query("DELETE FROM auctions WHERE id = $1")
        .bind(auction_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?;

    tx.commit()
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?;

    info!("{:<12} --> 경매 삭제 성공: id={}", "Command", auction_id);
    Ok(())
}

/// 2-3. 경매 재등록
/// 종료 정산이 끝난 경매를 같은 id로 새 일정으로 되살린다.
/// 입찰 기록과 현재가, 낙찰자, 정산 플래그가 모두 초기화된다.
pub async fn handle_republish(
    auction_id: i64,
    user_id: i64,
    cmd: RepublishCommand,
    db_manager: &DatabaseManager,
) -> Result<Auction, serde_json::Value> {
    info!(
        "{:<12} --> 경매 재등록 요청 처리 시작: auction={}, user={}",
        "Command", auction_id, user_id
    );

    let auction = handlers::get_auction(db_manager, auction_id)
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?
        .ok_or_else(|| {
            serde_json::json!({"error": "경매를 찾을 수 없습니다.", "code": "NOT_FOUND"})
        })?;

    if auction.created_by != user_id {
        return Err(serde_json::json!({
            "error": "본인의 경매만 재등록할 수 있습니다.",
            "code": "FORBIDDEN"
        }));
    }
    if !auction.commission_calculated {
        return Err(serde_json::json!({
            "error": "종료 정산이 완료된 경매만 재등록할 수 있습니다.",
            "code": "NOT_CLOSED"
        }));
    }

    let now = Utc::now();
    validate_schedule(cmd.start_time, cmd.end_time, now)?;

    let mut tx = db_manager
        .pool()
        .begin()
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?;

    sqlx::query("DELETE FROM bids WHERE auction_id = $1")
        .bind(auction_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?;

    let republished = sqlx::query_as::<_, Auction>(
        "UPDATE auctions
         SET start_time = $1, end_time = $2, current_bid = starting_bid,
             highest_bidder = NULL, commission_calculated = FALSE, status = 'SCHEDULED'
         WHERE id = $3
         RETURNING *",
    )
    .bind(cmd.start_time)
    .bind(cmd.end_time)
    .bind(auction_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?;

    // 명시적 정책: 재등록 시 판매자 미납 수수료를 0으로 되돌린다(기본 비활성)
    if republish_clears_commission() {
        warn!(
            "{:<12} --> 재등록 정책에 따라 판매자 미납 수수료 초기화: seller={}",
            "Command", auction.created_by
        );
        sqlx::query("UPDATE users SET unpaid_commission = 0 WHERE id = $1")
            .bind(auction.created_by)
            .execute(&mut *tx)
            .await
            .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?;
    }

    tx.commit()
        .await
        .map_err(|e| serde_json::json!({"error": e.to_string(), "code": "INTERNAL"}))?;

    info!("{:<12} --> 경매 재등록 성공: id={}", "Command", auction_id);
    Ok(republished)
}

/// 재등록 시 미납 수수료 초기화 정책(REPUBLISH_CLEARS_COMMISSION=true일 때만)
fn republish_clears_commission() -> bool {
    std::env::var("REPUBLISH_CLEARS_COMMISSION")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

// endregion: --- Auction Lifecycle

// endregion: --- Tests
