use super::model::BidEntry;
use crate::auction::model::{AuctionId, AuctionRecord, BidderId};
use crate::auction::store::AuctionStore;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 입찰 원장
///
/// 경매별 추가 전용 로그. `append` 가 유일한 변경 지점이며
/// 항목은 수정되거나 삭제되지 않는다.
#[async_trait]
pub trait BidLedger: Send + Sync {
    async fn append(
        &self,
        auction_id: AuctionId,
        bidder_id: BidderId,
        amount: i64,
        placed_at: DateTime<Utc>,
    ) -> Result<BidEntry, StoreError>;

    /// 최신순 (placed_at, id 역순)
    async fn list_for(&self, auction_id: AuctionId) -> Result<Vec<BidEntry>, StoreError>;

    /// 최신순 페이지
    async fn list_page(
        &self,
        auction_id: AuctionId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<BidEntry>, StoreError> {
        let entries = self.list_for(auction_id).await?;
        Ok(entries.into_iter().skip(offset).take(limit).collect())
    }

    /// 원장 스캔으로 구한 최고 입찰
    async fn highest_for(&self, auction_id: AuctionId) -> Result<Option<BidEntry>, StoreError> {
        let entries = self.list_for(auction_id).await?;
        Ok(entries.into_iter().max_by_key(|e| (e.amount, e.id)))
    }

    async fn count_for(&self, auction_id: AuctionId) -> Result<i64, StoreError> {
        Ok(self.list_for(auction_id).await?.len() as i64)
    }
}

/// 원장 추가와 투영 갱신을 하나의 트랜잭션으로 묶는 저장소
#[async_trait]
pub trait BiddingRepository: AuctionStore + BidLedger {
    /// `expected` 를 읽은 이후 투영이 바뀌었으면 `Conflict` 를 반환하고 아무것도 기록하지 않는다.
    async fn commit_bid(
        &self,
        expected: &AuctionRecord,
        bidder_id: BidderId,
        amount: i64,
        placed_at: DateTime<Utc>,
    ) -> Result<BidEntry, StoreError>;

    /// 같은 시점의 투영과 원장 최고 입찰을 함께 읽는다.
    async fn projection_snapshot(
        &self,
        auction_id: AuctionId,
    ) -> Result<(AuctionRecord, Option<BidEntry>), StoreError>;
}
