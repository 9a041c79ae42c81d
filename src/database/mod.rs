// region:    --- Imports
use crate::auction::model::{AuctionId, AuctionRecord, AuctionStatus, BidderId, NewAuction};
use crate::auction::store::AuctionStore;
use crate::bidding::ledger::{BidLedger, BiddingRepository};
use crate::bidding::model::BidEntry;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, info};

pub mod queries;

// endregion: --- Imports

// region:    --- Rows
/// auctions 테이블 행
#[derive(sqlx::FromRow)]
struct AuctionRow {
    id: i64,
    item_name: String,
    item_description: String,
    seller: String,
    starting_price: i64,
    bid_increment: i64,
    highest_bid: i64,
    highest_bidder: Option<i64>,
    closes_at: DateTime<Utc>,
    status: String,
    version: i64,
    created_at: DateTime<Utc>,
}

impl From<AuctionRow> for AuctionRecord {
    fn from(row: AuctionRow) -> Self {
        AuctionRecord {
            id: row.id,
            item_name: row.item_name,
            item_description: row.item_description,
            seller: row.seller,
            starting_price: row.starting_price,
            bid_increment: row.bid_increment,
            highest_bid: row.highest_bid,
            highest_bidder: row.highest_bidder,
            closes_at: row.closes_at,
            status: AuctionStatus::parse(&row.status),
            version: row.version,
            created_at: row.created_at,
        }
    }
}
// endregion: --- Rows

// region:    --- Database Manager
pub struct DatabaseManager {
    pub pool: Arc<PgPool>,
}

impl DatabaseManager {
    /// 데이터베이스 매니저 생성
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// 트랜잭션 실행
    pub async fn transaction<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: for<'c> FnOnce(
            &'c mut sqlx::Transaction<'_, sqlx::Postgres>,
        ) -> Pin<Box<dyn Future<Output = Result<R, E>> + Send + 'c>>,
        E: From<sqlx::Error>,
    {
        let mut tx = self.pool.begin().await?;
        let result = f(&mut tx).await;
        match result {
            Ok(r) => {
                tx.commit().await?;
                Ok(r)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    /// 데이터베이스 초기화
    /// reset 이 true 이면 기존 테이블을 삭제하고 다시 만든다.
    pub async fn initialize_database(&self, reset: bool) -> Result<(), sqlx::Error> {
        if reset {
            info!("{:<12} --> 기존 테이블 삭제", "Database");
            let recreate_db_sql = include_str!("../sql/00-recreate-db.sql");
            self.execute_multi_query(recreate_db_sql).await?;
        }

        let create_schema_sql = include_str!("../sql/01-create-schema.sql");
        self.execute_multi_query(create_schema_sql).await?;

        Ok(())
    }

    /// 여러 쿼리 실행
    async fn execute_multi_query(&self, sql: &str) -> Result<(), sqlx::Error> {
        for query in sql.split(';') {
            let query = query.trim();
            if !query.is_empty() {
                sqlx::query(query).execute(&*self.pool).await?;
            }
        }
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 갱신이 0건일 때 원인 구분 (없는 경매 / 충돌)
    async fn missing_or_conflict(&self, auction_id: AuctionId) -> StoreError {
        let found = sqlx::query(queries::AUCTION_EXISTS)
            .bind(auction_id)
            .fetch_one(self.pool())
            .await
            .map(|row| row.get::<bool, _>("found"));
        match found {
            Ok(true) => StoreError::Conflict(auction_id),
            Ok(false) => StoreError::NotFound(auction_id),
            Err(e) => StoreError::Database(e),
        }
    }
}
// endregion: --- Database Manager

// region:    --- Auction Store
#[async_trait]
impl AuctionStore for DatabaseManager {
    async fn create(&self, new: NewAuction, now: DateTime<Utc>) -> Result<AuctionRecord, StoreError> {
        info!("{:<12} --> 경매 등록: {}", "Store", new.item_name);
        let row = sqlx::query_as::<_, AuctionRow>(queries::INSERT_AUCTION)
            .bind(&new.item_name)
            .bind(&new.item_description)
            .bind(&new.seller)
            .bind(new.starting_price)
            .bind(new.bid_increment)
            .bind(new.closes_at)
            .bind(now)
            .fetch_one(self.pool())
            .await?;
        Ok(row.into())
    }

    async fn get(&self, auction_id: AuctionId) -> Result<AuctionRecord, StoreError> {
        debug!("{:<12} --> 경매 조회 id: {}", "Store", auction_id);
        sqlx::query_as::<_, AuctionRow>(queries::GET_AUCTION)
            .bind(auction_id)
            .fetch_optional(self.pool())
            .await?
            .map(AuctionRecord::from)
            .ok_or(StoreError::NotFound(auction_id))
    }

    async fn list(&self) -> Result<Vec<AuctionRecord>, StoreError> {
        let rows = sqlx::query_as::<_, AuctionRow>(queries::GET_ALL_AUCTIONS)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(AuctionRecord::from).collect())
    }

    async fn update(
        &self,
        auction_id: AuctionId,
        expected_version: i64,
        new_highest_bid: i64,
        new_highest_bidder: BidderId,
    ) -> Result<AuctionRecord, StoreError> {
        let updated = sqlx::query_as::<_, AuctionRow>(queries::UPDATE_HIGHEST_BID)
            .bind(new_highest_bid)
            .bind(new_highest_bidder)
            .bind(auction_id)
            .bind(expected_version)
            .fetch_optional(self.pool())
            .await?;
        match updated {
            Some(row) => Ok(row.into()),
            None => Err(self.missing_or_conflict(auction_id).await),
        }
    }

    async fn close(&self, auction_id: AuctionId) -> Result<bool, StoreError> {
        let result = sqlx::query(queries::CLOSE_AUCTION)
            .bind(auction_id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 1 {
            return Ok(true);
        }
        // 이미 종료된 경매는 그대로 둔다
        match self.missing_or_conflict(auction_id).await {
            StoreError::Conflict(_) => Ok(false),
            e => Err(e),
        }
    }

    async fn close_expired(&self, now: DateTime<Utc>) -> Result<Vec<AuctionRecord>, StoreError> {
        let rows = sqlx::query_as::<_, AuctionRow>(queries::CLOSE_EXPIRED_AUCTIONS)
            .bind(now)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(AuctionRecord::from).collect())
    }
}
// endregion: --- Auction Store

// region:    --- Bid Ledger
#[async_trait]
impl BidLedger for DatabaseManager {
    async fn append(
        &self,
        auction_id: AuctionId,
        bidder_id: BidderId,
        amount: i64,
        placed_at: DateTime<Utc>,
    ) -> Result<BidEntry, StoreError> {
        let entry = sqlx::query_as::<_, BidEntry>(queries::INSERT_BID)
            .bind(auction_id)
            .bind(bidder_id)
            .bind(amount)
            .bind(placed_at)
            .fetch_one(self.pool())
            .await?;
        Ok(entry)
    }

    async fn list_for(&self, auction_id: AuctionId) -> Result<Vec<BidEntry>, StoreError> {
        debug!("{:<12} --> 입찰 이력 조회 id: {}", "Store", auction_id);
        let entries = sqlx::query_as::<_, BidEntry>(queries::GET_BID_HISTORY)
            .bind(auction_id)
            .fetch_all(self.pool())
            .await?;
        Ok(entries)
    }

    async fn list_page(
        &self,
        auction_id: AuctionId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<BidEntry>, StoreError> {
        let entries = sqlx::query_as::<_, BidEntry>(queries::GET_BID_HISTORY_PAGE)
            .bind(auction_id)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(self.pool())
            .await?;
        Ok(entries)
    }

    async fn highest_for(&self, auction_id: AuctionId) -> Result<Option<BidEntry>, StoreError> {
        let entry = sqlx::query_as::<_, BidEntry>(queries::GET_HIGHEST_BID)
            .bind(auction_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(entry)
    }

    async fn count_for(&self, auction_id: AuctionId) -> Result<i64, StoreError> {
        let row = sqlx::query(queries::COUNT_BIDS)
            .bind(auction_id)
            .fetch_one(self.pool())
            .await?;
        Ok(row.get("bid_count"))
    }
}
// endregion: --- Bid Ledger

// region:    --- Bidding Repository
/// 투영 갱신(버전 비교)과 원장 추가를 한 트랜잭션에서 처리한다.
/// 갱신된 행이 없으면 롤백 후 충돌로 보고한다.
#[async_trait]
impl BiddingRepository for DatabaseManager {
    async fn commit_bid(
        &self,
        expected: &AuctionRecord,
        bidder_id: BidderId,
        amount: i64,
        placed_at: DateTime<Utc>,
    ) -> Result<BidEntry, StoreError> {
        let auction_id = expected.id;
        let expected_version = expected.version;
        self.transaction(|tx| {
            Box::pin(async move {
                let updated = sqlx::query(queries::UPDATE_HIGHEST_BID)
                    .bind(amount)
                    .bind(bidder_id)
                    .bind(auction_id)
                    .bind(expected_version)
                    .fetch_optional(&mut **tx)
                    .await?;
                if updated.is_none() {
                    debug!(
                        "{:<12} --> 버전 충돌: auction={}, expected={}",
                        "Store", auction_id, expected_version
                    );
                    return Err(StoreError::Conflict(auction_id));
                }

                let entry = sqlx::query_as::<_, BidEntry>(queries::INSERT_BID)
                    .bind(auction_id)
                    .bind(bidder_id)
                    .bind(amount)
                    .bind(placed_at)
                    .fetch_one(&mut **tx)
                    .await?;
                Ok(entry)
            })
        })
        .await
    }

    async fn projection_snapshot(
        &self,
        auction_id: AuctionId,
    ) -> Result<(AuctionRecord, Option<BidEntry>), StoreError> {
        self.transaction(|tx| {
            Box::pin(async move {
                sqlx::query(queries::SET_REPEATABLE_READ)
                    .execute(&mut **tx)
                    .await?;
                let record = sqlx::query_as::<_, AuctionRow>(queries::GET_AUCTION)
                    .bind(auction_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .map(AuctionRecord::from)
                    .ok_or(StoreError::NotFound(auction_id))?;
                let highest = sqlx::query_as::<_, BidEntry>(queries::GET_HIGHEST_BID)
                    .bind(auction_id)
                    .fetch_optional(&mut **tx)
                    .await?;
                Ok((record, highest))
            })
        })
        .await
    }
}
// endregion: --- Bidding Repository

/// Postgres 연동 테스트. DATABASE_URL 이 있을 때 `cargo test -- --ignored` 로 실행한다.
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn connect() -> Option<DatabaseManager> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let db = DatabaseManager::new(&url, 2).await.unwrap();
        db.initialize_database(false).await.unwrap();
        Some(db)
    }

    fn listing(now: DateTime<Utc>) -> NewAuction {
        NewAuction {
            item_name: "Kinder Joy".to_string(),
            item_description: "cokelat telur".to_string(),
            seller: "toko".to_string(),
            starting_price: 13000,
            bid_increment: 1000,
            closes_at: now + Duration::hours(2),
        }
    }

    #[tokio::test]
    #[ignore]
    async fn stale_commit_rolls_back() {
        let Some(db) = connect().await else { return };
        let now = Utc::now();
        let record = db.create(listing(now), now).await.unwrap();
        assert_eq!(record.version, 0);
        assert_eq!(record.status, AuctionStatus::Open);

        let entry = db.commit_bid(&record, 1, 14000, now).await.unwrap();
        assert_eq!(entry.amount, 14000);

        // 같은 버전으로 다시 커밋하면 충돌, 원장에는 아무것도 남지 않는다
        let stale = db.commit_bid(&record, 2, 15000, now).await;
        assert!(matches!(stale, Err(StoreError::Conflict(id)) if id == record.id));
        assert_eq!(db.count_for(record.id).await.unwrap(), 1);

        let current = db.get(record.id).await.unwrap();
        assert_eq!(current.highest_bid, 14000);
        assert_eq!(current.highest_bidder, Some(1));
        assert_eq!(current.version, 1);

        let (projected, highest) = db.projection_snapshot(record.id).await.unwrap();
        assert_eq!(projected, current);
        assert_eq!(highest, Some(entry));
    }

    #[tokio::test]
    #[ignore]
    async fn history_pages_most_recent_first() {
        let Some(db) = connect().await else { return };
        let now = Utc::now();
        let record = db.create(listing(now), now).await.unwrap();

        for (i, amount) in [13000, 14000, 15000].into_iter().enumerate() {
            let current = db.get(record.id).await.unwrap();
            db.commit_bid(&current, i as i64 + 1, amount, now + Duration::seconds(i as i64))
                .await
                .unwrap();
        }

        let amounts = |entries: Vec<BidEntry>| entries.iter().map(|e| e.amount).collect::<Vec<_>>();
        assert_eq!(amounts(db.list_for(record.id).await.unwrap()), vec![15000, 14000, 13000]);
        assert_eq!(amounts(db.list_page(record.id, 1, 1).await.unwrap()), vec![14000]);
        assert!(db.list_page(record.id, 3, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn close_and_missing_auctions() {
        let Some(db) = connect().await else { return };
        let now = Utc::now();
        let record = db.create(listing(now), now).await.unwrap();

        assert!(db.close(record.id).await.unwrap());
        assert!(!db.close(record.id).await.unwrap());
        assert!(matches!(
            db.commit_bid(&db.get(record.id).await.unwrap(), 1, 14000, now).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(db.get(-1).await, Err(StoreError::NotFound(-1))));
        assert!(matches!(db.close(-1).await, Err(StoreError::NotFound(-1))));
    }
}
