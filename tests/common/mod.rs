#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use axum_test::TestServer;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tower::Layer;

use safe_shortener::application::services::{
    AuthService, BulkImportService, ClickService, RedirectService, ShortUrlService,
    ValidationService,
};
use safe_shortener::domain::checkers::{
    BlockListChecker, CheckError, ListKind, ReachabilityChecker, ReachabilityVerdict,
    SafetyChecker, SafetyVerdict,
};
use safe_shortener::domain::click_event::ClickEvent;
use safe_shortener::domain::entities::{ShortUrl, ShortUrlProperties, ValidationOutcome};
use safe_shortener::domain::repositories::ShortUrlRepository;
use safe_shortener::infrastructure::checkers::StaticBlockListProvider;
use safe_shortener::infrastructure::persistence::{MemoryClickRepository, MemoryShortUrlRepository};
use safe_shortener::infrastructure::reports::FileReportStore;
use safe_shortener::state::AppState;

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const BASE_URL: &str = "http://localhost:3000";

/// Reachability probe with a fixed answer.
pub struct FixedReachability(pub bool);

#[async_trait]
impl ReachabilityChecker for FixedReachability {
    async fn check(&self, _url: &str) -> ReachabilityVerdict {
        if self.0 {
            ReachabilityVerdict::Reachable
        } else {
            ReachabilityVerdict::NotReachable
        }
    }
}

/// Threat lookup with a fixed answer.
pub struct FixedSafety(pub Result<SafetyVerdict, u16>);

#[async_trait]
impl SafetyChecker for FixedSafety {
    async fn check(&self, _url: &str) -> Result<SafetyVerdict, CheckError> {
        self.0.map_err(CheckError::Status)
    }
}

/// Threat lookup that holds its verdict until released.
pub struct GatedSafety {
    verdict: SafetyVerdict,
    release: watch::Receiver<bool>,
}

impl GatedSafety {
    pub fn new(verdict: SafetyVerdict) -> (Self, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { verdict, release: rx }, tx)
    }
}

#[async_trait]
impl SafetyChecker for GatedSafety {
    async fn check(&self, _url: &str) -> Result<SafetyVerdict, CheckError> {
        let mut release = self.release.clone();
        release
            .wait_for(|open| *open)
            .await
            .map_err(|e| CheckError::Transport(e.to_string()))?;
        Ok(self.verdict)
    }
}

/// Checker configuration for a test app. Defaults pass every check.
pub struct Checks {
    pub blocked_urls: Vec<&'static str>,
    pub blocked_ips: Vec<&'static str>,
    pub reachability: Arc<dyn ReachabilityChecker>,
    pub safety: Arc<dyn SafetyChecker>,
}

impl Default for Checks {
    fn default() -> Self {
        Self {
            blocked_urls: Vec::new(),
            blocked_ips: Vec::new(),
            reachability: Arc::new(FixedReachability(true)),
            safety: Arc::new(FixedSafety(Ok(SafetyVerdict::Safe))),
        }
    }
}

pub struct TestApp {
    pub state: AppState,
    pub click_rx: mpsc::Receiver<ClickEvent>,
    pub short_urls: Arc<MemoryShortUrlRepository>,
    pub clicks: Arc<MemoryClickRepository>,
    pub reports: tempfile::TempDir,
}

pub async fn create_test_app(checks: Checks) -> TestApp {
    let short_urls = Arc::new(MemoryShortUrlRepository::new());
    let clicks = Arc::new(MemoryClickRepository::new());
    let (tx, rx) = mpsc::channel(100);

    let provider = StaticBlockListProvider::new()
        .with_entries(ListKind::Url, checks.blocked_urls)
        .with_entries(ListKind::Ip, checks.blocked_ips);
    let validation = Arc::new(ValidationService::new(
        short_urls.clone(),
        BlockListChecker::new(Arc::new(provider)),
        checks.reachability,
        checks.safety,
    ));

    let short_url_service = Arc::new(ShortUrlService::new(
        short_urls.clone(),
        clicks.clone(),
        validation.clone(),
        BASE_URL.to_string(),
    ));

    let reports = tempfile::tempdir().unwrap();
    let store = Arc::new(FileReportStore::new(reports.path().join("reports")));
    store.init().await.unwrap();

    let state = AppState {
        redirect_service: Arc::new(RedirectService::new(short_urls.clone())),
        bulk_import_service: Arc::new(BulkImportService::new(short_url_service.clone(), store)),
        short_url_service,
        validation_service: validation,
        auth_service: Arc::new(AuthService::new(
            Some(ADMIN_TOKEN.to_string()),
            "test-signing-secret".to_string(),
        )),
        click_service: ClickService::new(tx),
        short_url_repository: short_urls.clone(),
        behind_proxy: false,
    };

    TestApp {
        state,
        click_rx: rx,
        short_urls,
        clicks,
        reports,
    }
}

/// Inserts a record directly, bypassing validation.
pub async fn create_test_short_url(
    repo: &MemoryShortUrlRepository,
    hash: &str,
    target: &str,
) -> ShortUrl {
    repo.save(ShortUrl::new(
        hash.to_string(),
        target.to_string(),
        ShortUrlProperties {
            ip: Some("127.0.0.1".to_string()),
            ..Default::default()
        },
    ))
    .await
    .unwrap()
}

/// Polls `GET path` until it answers `status` or one second has passed.
pub async fn wait_for_status(server: &TestServer, path: &str, status: u16) -> bool {
    for _ in 0..100 {
        if server.get(path).await.status_code() == status {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Polls the repository until the record reaches `outcome` or one second
/// has passed.
pub async fn wait_for_outcome(
    repo: &MemoryShortUrlRepository,
    hash: &str,
    outcome: ValidationOutcome,
) -> bool {
    for _ in 0..100 {
        let record = repo.find_by_hash(hash).await.unwrap();
        if record.is_some_and(|r| r.outcome() == outcome) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
