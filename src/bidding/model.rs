use crate::auction::clock::ClockStatus;
use crate::auction::model::{AuctionId, BidderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 입찰 원장 항목 (추가 후 변경 없음)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BidEntry {
    pub id: i64,
    pub auction_id: AuctionId,
    pub bidder_id: BidderId,
    pub amount: i64,
    pub placed_at: DateTime<Utc>,
}

// 입찰 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBidCommand {
    pub auction_id: AuctionId,
    pub bidder_id: BidderId,
    pub amount: i64,
}

// 입찰 접수 영수증
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedBid {
    pub auction_id: AuctionId,
    pub bidder_id: BidderId,
    pub amount: i64,
    pub placed_at: DateTime<Utc>,
}

impl From<&BidEntry> for AcceptedBid {
    fn from(entry: &BidEntry) -> Self {
        Self {
            auction_id: entry.auction_id,
            bidder_id: entry.bidder_id,
            amount: entry.amount,
            placed_at: entry.placed_at,
        }
    }
}

// 화면 표시용 경매 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionView {
    pub id: AuctionId,
    pub item_name: String,
    pub item_description: String,
    pub seller: String,
    pub starting_price: i64,
    pub highest_bid: i64,
    pub highest_bidder: Option<BidderId>,
    pub bid_increment: i64,
    pub minimum_bid: i64,
    pub bid_count: i64,
    pub closes_at: DateTime<Utc>,
    pub closes_in_seconds: i64,
    pub status: ClockStatus,
}

// 원장과 캐시된 투영의 일관성 점검 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionCheck {
    pub auction_id: AuctionId,
    pub ledger_highest_bid: i64,
    pub ledger_highest_bidder: Option<BidderId>,
    pub projected_highest_bid: i64,
    pub projected_highest_bidder: Option<BidderId>,
    pub consistent: bool,
}

// 입찰 이력 페이지 조건
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct BidHistoryQuery {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}
