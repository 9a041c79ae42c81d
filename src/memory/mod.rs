/// 메모리 저장소
/// 데이터베이스 없이 실행할 때와 테스트에서 사용한다.
/// 경매별 슬롯에 레코드와 원장을 함께 두어, 커밋 시 해당 경매의 슬롯만 잠근다.
// region:    --- Imports
use crate::auction::model::{AuctionId, AuctionRecord, AuctionStatus, BidderId, NewAuction};
use crate::auction::store::AuctionStore;
use crate::bidding::ledger::{BidLedger, BiddingRepository};
use crate::bidding::model::BidEntry;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

// endregion: --- Imports

// region:    --- In Memory Repository
struct AuctionSlot {
    record: AuctionRecord,
    bids: Vec<BidEntry>,
}

#[derive(Default)]
pub struct InMemoryRepository {
    auctions: DashMap<AuctionId, AuctionSlot>,
    next_auction_id: AtomicI64,
    next_bid_id: AtomicI64,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_bid_id(&self) -> i64 {
        self.next_bid_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn push_bid(
        &self,
        slot: &mut AuctionSlot,
        bidder_id: BidderId,
        amount: i64,
        placed_at: DateTime<Utc>,
    ) -> BidEntry {
        let entry = BidEntry {
            id: self.next_bid_id(),
            auction_id: slot.record.id,
            bidder_id,
            amount,
            placed_at,
        };
        slot.bids.push(entry.clone());
        entry
    }
}

#[async_trait]
impl AuctionStore for InMemoryRepository {
    async fn create(&self, new: NewAuction, now: DateTime<Utc>) -> Result<AuctionRecord, StoreError> {
        let id = self.next_auction_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = AuctionRecord {
            id,
            item_name: new.item_name,
            item_description: new.item_description,
            seller: new.seller,
            starting_price: new.starting_price,
            bid_increment: new.bid_increment,
            highest_bid: new.starting_price,
            highest_bidder: None,
            closes_at: new.closes_at,
            status: AuctionStatus::Open,
            version: 0,
            created_at: now,
        };
        self.auctions.insert(
            id,
            AuctionSlot {
                record: record.clone(),
                bids: Vec::new(),
            },
        );
        Ok(record)
    }

    async fn get(&self, auction_id: AuctionId) -> Result<AuctionRecord, StoreError> {
        self.auctions
            .get(&auction_id)
            .map(|slot| slot.record.clone())
            .ok_or(StoreError::NotFound(auction_id))
    }

    async fn list(&self) -> Result<Vec<AuctionRecord>, StoreError> {
        let mut records: Vec<AuctionRecord> =
            self.auctions.iter().map(|slot| slot.record.clone()).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    async fn update(
        &self,
        auction_id: AuctionId,
        expected_version: i64,
        new_highest_bid: i64,
        new_highest_bidder: BidderId,
    ) -> Result<AuctionRecord, StoreError> {
        let mut slot = self
            .auctions
            .get_mut(&auction_id)
            .ok_or(StoreError::NotFound(auction_id))?;
        let record = &mut slot.record;
        let raises = new_highest_bid > record.highest_bid
            || (record.highest_bidder.is_none() && new_highest_bid == record.highest_bid);
        if record.version != expected_version || !raises {
            return Err(StoreError::Conflict(auction_id));
        }
        record.highest_bid = new_highest_bid;
        record.highest_bidder = Some(new_highest_bidder);
        record.version += 1;
        Ok(record.clone())
    }

    async fn close(&self, auction_id: AuctionId) -> Result<bool, StoreError> {
        let mut slot = self
            .auctions
            .get_mut(&auction_id)
            .ok_or(StoreError::NotFound(auction_id))?;
        if slot.record.status == AuctionStatus::Closed {
            return Ok(false);
        }
        slot.record.status = AuctionStatus::Closed;
        slot.record.version += 1;
        Ok(true)
    }

    async fn close_expired(&self, now: DateTime<Utc>) -> Result<Vec<AuctionRecord>, StoreError> {
        let mut closed = Vec::new();
        for mut slot in self.auctions.iter_mut() {
            let record = &mut slot.record;
            if record.status == AuctionStatus::Open && record.closes_at <= now {
                record.status = AuctionStatus::Closed;
                record.version += 1;
                closed.push(record.clone());
            }
        }
        Ok(closed)
    }
}

#[async_trait]
impl BidLedger for InMemoryRepository {
    async fn append(
        &self,
        auction_id: AuctionId,
        bidder_id: BidderId,
        amount: i64,
        placed_at: DateTime<Utc>,
    ) -> Result<BidEntry, StoreError> {
        let mut slot = self
            .auctions
            .get_mut(&auction_id)
            .ok_or(StoreError::NotFound(auction_id))?;
        Ok(self.push_bid(&mut slot, bidder_id, amount, placed_at))
    }

    async fn list_for(&self, auction_id: AuctionId) -> Result<Vec<BidEntry>, StoreError> {
        let Some(slot) = self.auctions.get(&auction_id) else {
            return Ok(Vec::new());
        };
        let mut entries = slot.bids.clone();
        entries.sort_by(|a, b| b.placed_at.cmp(&a.placed_at).then(b.id.cmp(&a.id)));
        Ok(entries)
    }

    async fn count_for(&self, auction_id: AuctionId) -> Result<i64, StoreError> {
        Ok(self
            .auctions
            .get(&auction_id)
            .map(|slot| slot.bids.len() as i64)
            .unwrap_or(0))
    }
}

#[async_trait]
impl BiddingRepository for InMemoryRepository {
    async fn commit_bid(
        &self,
        expected: &AuctionRecord,
        bidder_id: BidderId,
        amount: i64,
        placed_at: DateTime<Utc>,
    ) -> Result<BidEntry, StoreError> {
        let mut slot = self
            .auctions
            .get_mut(&expected.id)
            .ok_or(StoreError::NotFound(expected.id))?;

        // 읽은 이후 다른 입찰이나 종료가 반영되었으면 충돌
        if slot.record.version != expected.version || slot.record.status != AuctionStatus::Open {
            debug!(
                "{:<12} --> 버전 충돌: auction={}, expected={}, actual={}",
                "Store", expected.id, expected.version, slot.record.version
            );
            return Err(StoreError::Conflict(expected.id));
        }

        slot.record.highest_bid = amount;
        slot.record.highest_bidder = Some(bidder_id);
        slot.record.version += 1;
        Ok(self.push_bid(&mut slot, bidder_id, amount, placed_at))
    }

    async fn projection_snapshot(
        &self,
        auction_id: AuctionId,
    ) -> Result<(AuctionRecord, Option<BidEntry>), StoreError> {
        // 슬롯 읽기 잠금 하나로 두 값을 함께 읽는다
        let slot = self
            .auctions
            .get(&auction_id)
            .ok_or(StoreError::NotFound(auction_id))?;
        let highest = slot.bids.iter().max_by_key(|e| (e.amount, e.id)).cloned();
        Ok((slot.record.clone(), highest))
    }
}
// endregion: --- In Memory Repository
