// region:    --- Imports
use crate::bidding::validator::BidPolicy;
use clap::{ArgAction, Args, Parser};
use std::net::SocketAddr;
use std::time::Duration;

// endregion: --- Imports

// region:    --- Config
/// 입찰 서비스 실행 옵션 (명령행 인자 또는 환경 변수)
#[derive(Parser, Debug, Clone)]
#[command(name = "bidding-service")]
#[command(version, about = "Auction bidding service")]
pub struct Config {
    /// 서버 바인드 주소
    #[arg(long = "bind-addr", env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind_addr: SocketAddr,

    /// Postgres 접속 URL. 없으면 메모리 저장소를 사용한다.
    #[arg(long = "database-url", env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long = "database-max-connections", env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    pub database_max_connections: u32,

    /// 시작 시 테이블을 삭제하고 다시 생성
    #[arg(long = "reset-database", env = "RESET_DATABASE")]
    pub reset_database: bool,

    /// Kafka 브로커 목록. 없으면 이벤트를 로그로만 남긴다.
    #[arg(long = "kafka-brokers", env = "KAFKA_BROKERS")]
    pub kafka_brokers: Option<String>,

    #[arg(long = "kafka-topic", env = "KAFKA_TOPIC", default_value = "auction-events")]
    pub kafka_topic: String,

    #[command(flatten)]
    pub bidding: BiddingOptions,
}

#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "Bidding Options")]
pub struct BiddingOptions {
    /// 최고가 대비 차액이 입찰 단위의 배수가 아니면 거절
    #[arg(
        long = "require-increment-alignment",
        env = "REQUIRE_INCREMENT_ALIGNMENT",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub require_increment_alignment: bool,

    /// 현재 최고 입찰자의 재입찰 거절
    #[arg(
        long = "forbid-self-outbid",
        env = "FORBID_SELF_OUTBID",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub forbid_self_outbid: bool,

    /// 첫 입찰은 시작가부터 허용
    #[arg(
        long = "allow-opening-bid-at-start",
        env = "ALLOW_OPENING_BID_AT_START",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub allow_opening_bid_at_start: bool,

    /// 마감 임박(ClosingSoon) 표시 기준 (초)
    #[arg(long = "closing-soon-secs", env = "CLOSING_SOON_SECS", default_value_t = 300)]
    pub closing_soon_secs: i64,

    /// 저장소 호출 제한 시간 (밀리초)
    #[arg(long = "store-timeout-ms", env = "STORE_TIMEOUT_MS", default_value_t = 2000)]
    pub store_timeout_ms: u64,

    /// 경매 종료 스케줄러 주기 (밀리초)
    #[arg(long = "scheduler-interval-ms", env = "SCHEDULER_INTERVAL_MS", default_value_t = 1000)]
    pub scheduler_interval_ms: u64,
}

impl BiddingOptions {
    pub fn policy(&self) -> BidPolicy {
        BidPolicy {
            require_increment_alignment: self.require_increment_alignment,
            forbid_self_outbid: self.forbid_self_outbid,
            allow_opening_bid_at_start: self.allow_opening_bid_at_start,
        }
    }

    pub fn closing_soon(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.closing_soon_secs.max(0))
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn scheduler_interval(&self) -> Duration {
        Duration::from_millis(self.scheduler_interval_ms.max(1))
    }
}
// endregion: --- Config
