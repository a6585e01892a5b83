// region:    --- Imports
use super::queries;
use crate::bidding::model::{Auction, Bid, User};
use crate::commission::CommissionProof;
use crate::database::DatabaseManager;
use crate::moderation::Report;
use chrono::{DateTime, Utc};
use sqlx::Error as SqlxError;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// 경매 조회
pub async fn get_auction(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<Option<Auction>, SqlxError> {
    info!("{:<12} --> 경매 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
                    .bind(auction_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 모든 경매 조회
pub async fn get_all_auctions(db_manager: &DatabaseManager) -> Result<Vec<Auction>, SqlxError> {
    info!("{:<12} --> 모든 경매 조회", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Auction>(queries::GET_ALL_AUCTIONS)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 경매 입찰 목록 조회(금액 내림차순)
pub async fn get_auction_bids(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<Vec<Bid>, SqlxError> {
    info!("{:<12} --> 경매 입찰 목록 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Bid>(queries::GET_AUCTION_BIDS)
                    .bind(auction_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 최고 입찰가 조회
pub async fn get_highest_bid(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<Option<i64>, SqlxError> {
    info!("{:<12} --> 최고 입찰가 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_scalar::<_, Option<i64>>(queries::GET_HIGHEST_BID)
                    .bind(auction_id)
                    .fetch_one(&mut **tx)
                    .await
            })
        })
        .await
}

/// 입찰 존재 여부 조회
pub async fn has_bids(db_manager: &DatabaseManager, auction_id: i64) -> Result<bool, SqlxError> {
    info!("{:<12} --> 입찰 존재 여부 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_scalar::<_, bool>(queries::HAS_BIDS)
                    .bind(auction_id)
                    .fetch_one(&mut **tx)
                    .await
            })
        })
        .await
}

/// 판매자의 진행 중 경매 수 조회
pub async fn count_open_auctions(
    db_manager: &DatabaseManager,
    seller_id: i64,
    now: DateTime<Utc>,
) -> Result<i64, SqlxError> {
    info!(
        "{:<12} --> 진행 중 경매 수 조회 seller: {}",
        "Query", seller_id
    );
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_scalar::<_, i64>(queries::COUNT_OPEN_AUCTIONS)
                    .bind(seller_id)
                    .bind(now)
                    .fetch_one(&mut **tx)
                    .await
            })
        })
        .await
}

/// 사용자 조회
pub async fn get_user(
    db_manager: &DatabaseManager,
    user_id: i64,
) -> Result<Option<User>, SqlxError> {
    info!("{:<12} --> 사용자 조회 id: {}", "Query", user_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, User>(queries::GET_USER)
                    .bind(user_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 모든 수수료 납부 증빙 조회
pub async fn get_all_proofs(
    db_manager: &DatabaseManager,
) -> Result<Vec<CommissionProof>, SqlxError> {
    info!("{:<12} --> 모든 수수료 증빙 조회", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, CommissionProof>(queries::GET_ALL_PROOFS)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 모든 신고 조회
pub async fn get_all_reports(db_manager: &DatabaseManager) -> Result<Vec<Report>, SqlxError> {
    info!("{:<12} --> 모든 신고 조회", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Report>(queries::GET_ALL_REPORTS)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

// endregion: --- Query Handlers
