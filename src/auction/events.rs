use super::model::{AuctionId, BidderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum AuctionEvent {
    // 입찰 이벤트
    BidPlaced {
        auction_id: AuctionId,
        bidder_id: BidderId,
        amount: i64,
        placed_at: DateTime<Utc>,
    },
    // 경매 종료 이벤트
    AuctionClosed {
        auction_id: AuctionId,
        highest_bid: i64,
        highest_bidder: Option<BidderId>,
        closed_at: DateTime<Utc>,
    },
}

impl AuctionEvent {
    pub fn auction_id(&self) -> AuctionId {
        match self {
            AuctionEvent::BidPlaced { auction_id, .. } => *auction_id,
            AuctionEvent::AuctionClosed { auction_id, .. } => *auction_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            AuctionEvent::BidPlaced { .. } => "BidPlaced",
            AuctionEvent::AuctionClosed { .. } => "AuctionClosed",
        }
    }
}
