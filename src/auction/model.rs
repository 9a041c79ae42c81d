use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub type AuctionId = i64;
pub type BidderId = i64;

// 경매 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Open,
    Closed,
}

impl AuctionStatus {
    /// 알 수 없는 값은 입찰이 열리지 않도록 종료로 취급한다.
    pub fn parse(s: &str) -> Self {
        match s {
            "OPEN" => AuctionStatus::Open,
            "CLOSED" => AuctionStatus::Closed,
            other => {
                warn!("{:<12} --> 알 수 없는 경매 상태 '{}': 종료로 처리", "Model", other);
                AuctionStatus::Closed
            }
        }
    }
}

// 경매 레코드
// highest_bid / highest_bidder 는 입찰 원장 최대값의 캐시된 투영이다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionRecord {
    pub id: AuctionId,
    pub item_name: String,
    pub item_description: String,
    pub seller: String,
    pub starting_price: i64,
    pub bid_increment: i64,
    pub highest_bid: i64,
    pub highest_bidder: Option<BidderId>,
    pub closes_at: DateTime<Utc>,
    pub status: AuctionStatus,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl AuctionRecord {
    /// 아직 입찰이 없는지
    pub fn has_no_bids(&self) -> bool {
        self.highest_bidder.is_none()
    }
}

// 경매 등록 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuction {
    pub item_name: String,
    #[serde(default)]
    pub item_description: String,
    #[serde(default)]
    pub seller: String,
    pub starting_price: i64,
    pub bid_increment: i64,
    pub closes_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_never_reopens_bidding() {
        assert_eq!(AuctionStatus::parse("OPEN"), AuctionStatus::Open);
        assert_eq!(AuctionStatus::parse("CLOSED"), AuctionStatus::Closed);
        assert_eq!(AuctionStatus::parse("open"), AuctionStatus::Closed);
        assert_eq!(AuctionStatus::parse(""), AuctionStatus::Closed);
    }
}
