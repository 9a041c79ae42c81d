/// 입찰 서비스
/// 1. 경매 등록 / 조회 / 종료
/// 2. 입찰 (검증 -> 원장 추가 + 투영 갱신, 낙관적 동시성)
/// 3. 입찰 이력 / 투영 일관성 점검
// region:    --- Imports
use super::ledger::BiddingRepository;
use super::model::{AcceptedBid, AuctionView, BidEntry, PlaceBidCommand, ProjectionCheck};
use super::validator::{validate, BidPolicy};
use crate::auction::clock::AuctionClock;
use crate::auction::events::AuctionEvent;
use crate::auction::model::{AuctionId, AuctionRecord, NewAuction};
use crate::error::{BiddingError, RejectionReason, StoreError};
use crate::message_broker::EventPublisher;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
// endregion: --- Imports

// 충돌 시 재검증 포함 최대 시도 횟수 (최초 1회 + 재시도 1회)
const MAX_ATTEMPTS: usize = 2;

// 입찰 이력 기본 페이지 크기
const DEFAULT_PAGE_SIZE: usize = 50;

// region:    --- Bidding Service
pub struct BiddingService {
    repository: Arc<dyn BiddingRepository>,
    publisher: Arc<dyn EventPublisher>,
    clock: AuctionClock,
    policy: BidPolicy,
    store_timeout: Duration,
}

impl BiddingService {
    pub fn new(
        repository: Arc<dyn BiddingRepository>,
        publisher: Arc<dyn EventPublisher>,
        clock: AuctionClock,
        policy: BidPolicy,
        store_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            publisher,
            clock,
            policy,
            store_timeout,
        }
    }

    pub fn policy(&self) -> &BidPolicy {
        &self.policy
    }

    /// 저장소 호출을 제한 시간 안에서 실행
    async fn bounded<T, F>(&self, fut: F) -> Result<T, BiddingError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => result.map_err(BiddingError::from),
            Err(_) => {
                warn!("{:<12} --> 저장소 응답 시간 초과", "Command");
                Err(BiddingError::Transient("저장소 응답 시간 초과".to_string()))
            }
        }
    }

    /// 1. 입찰
    pub async fn place_bid(&self, cmd: PlaceBidCommand) -> Result<AcceptedBid, BiddingError> {
        info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

        for attempt in 1..=MAX_ATTEMPTS {
            let record = self.bounded(self.repository.get(cmd.auction_id)).await?;
            let now = self.clock.now();

            if !self.clock.status_of(&record, now).accepts_bids() {
                return Err(BiddingError::rejected(RejectionReason::Closed));
            }

            let amount = validate(&record, cmd.bidder_id, cmd.amount, now, &self.policy).map_err(
                |reason| BiddingError::Rejected {
                    reason,
                    minimum_bid: (reason == RejectionReason::TooLow)
                        .then(|| self.policy.minimum_bid(&record)),
                },
            )?;

            match self
                .bounded(self.repository.commit_bid(&record, cmd.bidder_id, amount, now))
                .await
            {
                Ok(entry) => {
                    info!(
                        "{:<12} --> 입찰 성공: auction={}, 현재 가격 {}",
                        "Command", entry.auction_id, entry.amount
                    );
                    self.publish(AuctionEvent::BidPlaced {
                        auction_id: entry.auction_id,
                        bidder_id: entry.bidder_id,
                        amount: entry.amount,
                        placed_at: entry.placed_at,
                    })
                    .await;
                    return Ok(AcceptedBid::from(&entry));
                }
                Err(BiddingError::Conflict(_)) => {
                    warn!(
                        "{:<12} --> 낙관적 업데이트로 인한 버전 충돌: 재검증 (시도: {}/{})",
                        "Command", attempt, MAX_ATTEMPTS
                    );
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(BiddingError::Conflict(cmd.auction_id))
    }

    /// 2. 경매 등록
    pub async fn create_auction(&self, new: NewAuction) -> Result<AuctionView, BiddingError> {
        let now = self.clock.now();
        if new.item_name.trim().is_empty() {
            return Err(BiddingError::InvalidAuction("상품명이 비어 있습니다.".to_string()));
        }
        if new.starting_price < 0 {
            return Err(BiddingError::InvalidAuction(
                "시작가는 0 이상이어야 합니다.".to_string(),
            ));
        }
        if new.bid_increment <= 0 {
            return Err(BiddingError::InvalidAuction(
                "입찰 단위는 0보다 커야 합니다.".to_string(),
            ));
        }
        if new.closes_at <= now {
            return Err(BiddingError::InvalidAuction(
                "마감 시각은 현재 이후여야 합니다.".to_string(),
            ));
        }

        let record = self.bounded(self.repository.create(new, now)).await?;
        info!(
            "{:<12} --> 경매 등록 id: {}, 시작가 {}, 입찰 단위 {}",
            "Command", record.id, record.starting_price, record.bid_increment
        );
        Ok(self.view(&record, 0))
    }

    /// 3. 경매 종료 (관리자). 이미 종료된 경매는 그대로 반환한다.
    pub async fn close_auction(&self, auction_id: AuctionId) -> Result<AuctionView, BiddingError> {
        let transitioned = self.bounded(self.repository.close(auction_id)).await?;
        let record = self.bounded(self.repository.get(auction_id)).await?;
        if transitioned {
            info!("{:<12} --> 경매 종료 id: {}", "Command", auction_id);
            self.publish(AuctionEvent::AuctionClosed {
                auction_id,
                highest_bid: record.highest_bid,
                highest_bidder: record.highest_bidder,
                closed_at: self.clock.now(),
            })
            .await;
        }
        let bid_count = self.bounded(self.repository.count_for(auction_id)).await?;
        Ok(self.view(&record, bid_count))
    }

    /// 경매 조회
    pub async fn get_auction(&self, auction_id: AuctionId) -> Result<AuctionView, BiddingError> {
        info!("{:<12} --> 경매 조회 id: {}", "Query", auction_id);
        let record = self.bounded(self.repository.get(auction_id)).await?;
        let bid_count = self.bounded(self.repository.count_for(auction_id)).await?;
        Ok(self.view(&record, bid_count))
    }

    /// 모든 경매 조회
    pub async fn list_auctions(&self) -> Result<Vec<AuctionView>, BiddingError> {
        info!("{:<12} --> 모든 경매 조회", "Query");
        let records = self.bounded(self.repository.list()).await?;
        let mut views = Vec::with_capacity(records.len());
        for record in &records {
            let bid_count = self.bounded(self.repository.count_for(record.id)).await?;
            views.push(self.view(record, bid_count));
        }
        Ok(views)
    }

    /// 입찰 이력 조회 (최신순)
    pub async fn bid_history(
        &self,
        auction_id: AuctionId,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<BidEntry>, BiddingError> {
        info!("{:<12} --> 입찰 이력 조회 id: {}", "Query", auction_id);
        // 없는 경매와 입찰이 없는 경매를 구분한다
        self.bounded(self.repository.get(auction_id)).await?;
        self.bounded(self.repository.list_page(
            auction_id,
            offset.unwrap_or(0),
            limit.unwrap_or(DEFAULT_PAGE_SIZE),
        ))
        .await
    }

    /// 원장 최대값과 캐시된 투영 비교
    pub async fn verify_projection(
        &self,
        auction_id: AuctionId,
    ) -> Result<ProjectionCheck, BiddingError> {
        info!("{:<12} --> 최고 입찰가 점검 id: {}", "Query", auction_id);
        let (record, highest) = self
            .bounded(self.repository.projection_snapshot(auction_id))
            .await?;

        let (ledger_highest_bid, ledger_highest_bidder) = match &highest {
            Some(entry) => (entry.amount, Some(entry.bidder_id)),
            None => (record.starting_price, None),
        };
        let consistent = ledger_highest_bid == record.highest_bid
            && ledger_highest_bidder == record.highest_bidder;
        if !consistent {
            warn!(
                "{:<12} --> 투영 불일치 auction={}: 원장 {}, 투영 {}",
                "Query", auction_id, ledger_highest_bid, record.highest_bid
            );
        }

        Ok(ProjectionCheck {
            auction_id,
            ledger_highest_bid,
            ledger_highest_bidder,
            projected_highest_bid: record.highest_bid,
            projected_highest_bidder: record.highest_bidder,
            consistent,
        })
    }

    /// 마감 시각이 지난 경매 일괄 종료 (스케줄러)
    pub async fn close_expired(&self) -> Result<Vec<AuctionRecord>, BiddingError> {
        let now = self.clock.now();
        let closed = self.bounded(self.repository.close_expired(now)).await?;
        for record in &closed {
            info!(
                "{:<12} --> 마감 시각 도달로 경매 종료 id: {}, 최종 가격 {}",
                "Scheduler", record.id, record.highest_bid
            );
            self.publish(AuctionEvent::AuctionClosed {
                auction_id: record.id,
                highest_bid: record.highest_bid,
                highest_bidder: record.highest_bidder,
                closed_at: now,
            })
            .await;
        }
        Ok(closed)
    }

    /// 이벤트 발행. 이미 커밋된 입찰은 발행 실패로 취소되지 않는다.
    async fn publish(&self, event: AuctionEvent) {
        if let Err(e) = self.publisher.publish(&event).await {
            warn!(
                "{:<12} --> 이벤트 발행 실패: type={}, auction={}, error={}",
                "Command",
                event.event_type(),
                event.auction_id(),
                e
            );
        }
    }

    fn view(&self, record: &AuctionRecord, bid_count: i64) -> AuctionView {
        let now = self.clock.now();
        AuctionView {
            id: record.id,
            item_name: record.item_name.clone(),
            item_description: record.item_description.clone(),
            seller: record.seller.clone(),
            starting_price: record.starting_price,
            highest_bid: record.highest_bid,
            highest_bidder: record.highest_bidder,
            bid_increment: record.bid_increment,
            minimum_bid: self.policy.minimum_bid(record),
            bid_count,
            closes_at: record.closes_at,
            closes_in_seconds: self.clock.remaining_secs(record, now),
            status: self.clock.status_of(record, now),
        }
    }
}
// endregion: --- Bidding Service
