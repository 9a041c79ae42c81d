// region:    --- Imports
use bidding_service::auction::clock::{AuctionClock, SystemClock};
use bidding_service::bidding::commands::BiddingService;
use bidding_service::bidding::ledger::BiddingRepository;
use bidding_service::config::Config;
use bidding_service::database::DatabaseManager;
use bidding_service::handlers;
use bidding_service::memory::InMemoryRepository;
use bidding_service::message_broker::{EventPublisher, KafkaManager, LogPublisher};
use bidding_service::scheduler::AuctionScheduler;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::parse();

    // 저장소 선택 (DATABASE_URL 이 없으면 메모리 저장소)
    let repository: Arc<dyn BiddingRepository> = match &config.database_url {
        Some(url) => {
            let db_manager = DatabaseManager::new(url, config.database_max_connections).await?;
            if let Err(e) = db_manager.initialize_database(config.reset_database).await {
                error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
                return Err(e.into());
            }
            info!("{:<12} --> 데이터베이스 초기화 성공", "Main");
            Arc::new(db_manager)
        }
        None => {
            warn!(
                "{:<12} --> DATABASE_URL 미설정: 메모리 저장소로 실행합니다.",
                "Main"
            );
            Arc::new(InMemoryRepository::new())
        }
    };

    // 이벤트 발행자 (Kafka 미설정 시 로그)
    let publisher: Arc<dyn EventPublisher> = match &config.kafka_brokers {
        Some(brokers) => {
            let kafka_manager = KafkaManager::new(brokers, &config.kafka_topic)?;
            if let Err(e) = kafka_manager.create_topic(5, 1).await {
                // 토픽이 이미 있는 경우도 여기로 온다
                warn!("{:<12} --> Kafka 토픽 생성 건너뜀: {}", "Main", e);
            }
            info!("{:<12} --> Kafka 초기화 성공", "Main");
            kafka_manager.get_producer()
        }
        None => Arc::new(LogPublisher),
    };

    let clock = AuctionClock::new(Arc::new(SystemClock), config.bidding.closing_soon());
    let service = Arc::new(BiddingService::new(
        repository,
        publisher,
        clock,
        config.bidding.policy(),
        config.bidding.store_timeout(),
    ));
    info!("{:<12} --> 입찰 정책: {:?}", "Main", service.policy());

    // 경매 종료 스케줄러
    let scheduler = AuctionScheduler::new(Arc::clone(&service), config.bidding.scheduler_interval());
    let _scheduler_handle = scheduler.start();

    // 라우터 설정
    let routes_all = handlers::routes(service);

    // 리스너 생성
    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
