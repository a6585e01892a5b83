use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 경매 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Auction {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub starting_bid: i64,
    pub current_bid: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_by: i64,
    pub highest_bidder: Option<i64>,
    pub commission_calculated: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

// 입찰 모델
// (auction_id, bidder_id)당 한 행만 존재하며 재입찰 시 amount가 갱신된다
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
    pub bidder_name: String,
    pub bidder_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// 사용자 모델(미납 수수료 잔액과 낙찰 통계 포함)
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub profile_image: Option<String>,
    pub role: String,
    pub unpaid_commission: i64,
    pub money_spent: i64,
    pub auctions_won: i64,
    pub created_at: DateTime<Utc>,
}
