//! Validation pipeline: fans out the checks of a short URL and records
//! their results.
//!
//! Every check runs as its own Tokio task and writes its result straight to
//! the [`ShortUrlRepository`] when it completes. Tasks never wait for each
//! other and never compute the overall outcome: the repository's
//! merge-aware updates make the final state independent of completion
//! order.
//!
//! The URL and IP block-list checks share `block_state`. Each records only
//! its own list as passed, so the field reads as settled once both have.
//!
//! Within a task, the `redirect_mode` update is applied before the state
//! update, so a reader that observes a failure state also observes its
//! redirect mode.
//!
//! # Dispatch
//!
//! - [`ValidationService::validate`] is the live path. It returns a
//!   [`ValidationHandle`] immediately; dropping the handle detaches the
//!   tasks. When a [`ReachabilityPublisher`] is configured the reachability
//!   check is published to the queue instead of being run in-process.
//! - [`ValidationService::validate_and_wait`] runs every check in-process
//!   and waits for all of them.
//!
//! # Shutdown
//!
//! [`ValidationService::shutdown`] signals every in-flight check. A check
//! that observes the signal before its verdict is ready stops and writes
//! nothing; checks started afterwards are cancelled immediately.

use std::future::Future;
use std::sync::Arc;

use strum::{AsRefStr, Display, IntoStaticStr};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::checkers::{
    BlockListChecker, ListKind, ReachabilityChecker, SafetyChecker, SafetyVerdict,
};
use crate::domain::entities::{BlockState, ReachableState, RedirectMode, SafetyState};
use crate::domain::reachability_queue::{ReachabilityMessage, ReachabilityPublisher};
use crate::domain::repositories::ShortUrlRepository;
use crate::error::AppError;

/// The independent checks run for every short URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum CheckKind {
    BlockUrl,
    BlockIp,
    Reachability,
    Safety,
}

impl CheckKind {
    pub const ALL: [CheckKind; 4] = [
        CheckKind::BlockUrl,
        CheckKind::BlockIp,
        CheckKind::Reachability,
        CheckKind::Safety,
    ];
}

/// How a single check ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum CheckOutcome {
    /// The check passed and its success was recorded.
    Passed,
    /// The check failed and the failure was recorded.
    Failed,
    /// The check was handed to the reachability queue.
    Dispatched,
    /// Shutdown was signalled before a verdict was available.
    Cancelled,
    /// The verdict could not be recorded, or the task panicked.
    Error,
}

/// Result of one check task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckReport {
    pub kind: CheckKind,
    pub outcome: CheckOutcome,
}

/// Everything a fan-out needs to know about a short URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    pub hash: String,
    pub url: String,
    pub ip: Option<String>,
}

impl ValidationRequest {
    pub fn new(hash: impl Into<String>, url: impl Into<String>, ip: Option<String>) -> Self {
        Self {
            hash: hash.into(),
            url: url.into(),
            ip,
        }
    }
}

/// Handle to the tasks of one fan-out.
///
/// Dropping the handle detaches the tasks; they keep running to completion.
#[must_use = "dropping the handle detaches the checks; call `join` to wait for them"]
#[derive(Debug)]
pub struct ValidationHandle {
    hash: String,
    tasks: Vec<(CheckKind, JoinHandle<CheckReport>)>,
}

impl ValidationHandle {
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for every check and returns their reports in [`CheckKind::ALL`] order.
    pub async fn join(self) -> Vec<CheckReport> {
        let mut reports = Vec::with_capacity(self.tasks.len());

        for (kind, task) in self.tasks {
            let outcome = match task.await {
                Ok(report) => report.outcome,
                Err(e) if e.is_cancelled() => CheckOutcome::Cancelled,
                Err(e) => {
                    tracing::error!(hash = %self.hash, check = %kind, error = %e, "Check task panicked");
                    CheckOutcome::Error
                }
            };
            reports.push(CheckReport { kind, outcome });
        }

        reports
    }

    /// Aborts every check that has not finished yet.
    pub fn abort(&self) {
        for (_, task) in &self.tasks {
            task.abort();
        }
    }
}

/// A result ready to be written to the repository.
#[derive(Debug, Clone, Copy)]
enum Finding {
    Block(BlockState),
    Reachability(ReachableState),
    Safety(SafetyState),
}

impl Finding {
    fn redirect_mode(self) -> Option<RedirectMode> {
        match self {
            Finding::Block(state) if state.is_failure() => Some(RedirectMode::FORBIDDEN),
            Finding::Safety(SafetyState::Unsafe) => Some(RedirectMode::FORBIDDEN),
            Finding::Reachability(state) if state.is_failure() => Some(RedirectMode::BAD_REQUEST),
            _ => None,
        }
    }

    fn is_failure(self) -> bool {
        match self {
            Finding::Block(state) => state.is_failure(),
            Finding::Reachability(state) => state.is_failure(),
            Finding::Safety(state) => state == SafetyState::Unsafe,
        }
    }
}

/// Collaborators shared by every check task.
struct Checkers {
    repository: Arc<dyn ShortUrlRepository>,
    block_list: BlockListChecker,
    reachability: Arc<dyn ReachabilityChecker>,
    safety: Arc<dyn SafetyChecker>,
}

impl Checkers {
    async fn find(&self, kind: CheckKind, request: &ValidationRequest) -> Finding {
        match kind {
            CheckKind::BlockUrl => {
                let verdict = self.block_list.check(&request.url, ListKind::Url).await;
                Finding::Block(if verdict.is_blocked() {
                    BlockState::FailBlockUrl
                } else {
                    BlockState::OkUrl
                })
            }
            CheckKind::BlockIp => {
                let blocked = match &request.ip {
                    Some(ip) => self.block_list.check(ip, ListKind::Ip).await.is_blocked(),
                    None => false,
                };
                Finding::Block(if blocked {
                    BlockState::FailBlockIp
                } else {
                    BlockState::OkIp
                })
            }
            CheckKind::Reachability => {
                let verdict = self.reachability.check(&request.url).await;
                Finding::Reachability(if verdict.is_reachable() {
                    ReachableState::Reachable
                } else {
                    ReachableState::FailNotReachable
                })
            }
            CheckKind::Safety => match self.safety.check(&request.url).await {
                Ok(SafetyVerdict::Safe) => Finding::Safety(SafetyState::Safe),
                Ok(SafetyVerdict::Unsafe) => Finding::Safety(SafetyState::Unsafe),
                Err(e) => {
                    tracing::warn!(hash = %request.hash, error = %e, "Threat lookup failed, recording as unsafe");
                    Finding::Safety(SafetyState::Unsafe)
                }
            },
        }
    }

    async fn record(&self, hash: &str, finding: Finding) -> Result<(), AppError> {
        if let Some(mode) = finding.redirect_mode() {
            self.repository.update_redirect_mode(hash, mode).await?;
        }

        let applied = match finding {
            Finding::Block(state) => self.repository.update_block_state(hash, state).await?,
            Finding::Reachability(state) => {
                self.repository.update_reachable_state(hash, state).await?
            }
            Finding::Safety(state) => self.repository.update_safe(hash, state.is_safe()).await?,
        };

        if !applied {
            tracing::debug!(hash, ?finding, "Update superseded by stored state");
        }

        Ok(())
    }
}

/// Orchestrates the validation checks of short URLs.
pub struct ValidationService {
    checkers: Arc<Checkers>,
    publisher: Option<Arc<dyn ReachabilityPublisher>>,
    shutdown: watch::Sender<bool>,
}

impl ValidationService {
    pub fn new(
        repository: Arc<dyn ShortUrlRepository>,
        block_list: BlockListChecker,
        reachability: Arc<dyn ReachabilityChecker>,
        safety: Arc<dyn SafetyChecker>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            checkers: Arc::new(Checkers {
                repository,
                block_list,
                reachability,
                safety,
            }),
            publisher: None,
            shutdown,
        }
    }

    /// Routes live reachability checks through `publisher`.
    pub fn with_reachability_queue(mut self, publisher: Arc<dyn ReachabilityPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Name of the reachability transport, `inline` when no queue is set.
    pub fn reachability_transport(&self) -> &'static str {
        self.publisher
            .as_ref()
            .map(|p| p.transport())
            .unwrap_or("inline")
    }

    pub async fn reachability_queue_healthy(&self) -> bool {
        match &self.publisher {
            Some(publisher) => publisher.health_check().await,
            None => true,
        }
    }

    /// Starts every check for `request` and returns without waiting.
    pub fn validate(&self, request: ValidationRequest) -> ValidationHandle {
        let request = Arc::new(request);
        let mut tasks = Vec::with_capacity(CheckKind::ALL.len());

        for kind in CheckKind::ALL {
            let task = match (kind, &self.publisher) {
                (CheckKind::Reachability, Some(publisher)) => {
                    self.spawn_dispatch(publisher.clone(), request.clone())
                }
                _ => self.spawn_check(kind, request.clone()),
            };
            tasks.push((kind, task));
        }

        tracing::debug!(hash = %request.hash, "Validation started");

        ValidationHandle {
            hash: request.hash.clone(),
            tasks,
        }
    }

    /// Runs every check in-process and waits for all of them.
    pub async fn validate_and_wait(&self, request: ValidationRequest) -> Vec<CheckReport> {
        let request = Arc::new(request);
        let handle = ValidationHandle {
            hash: request.hash.clone(),
            tasks: CheckKind::ALL
                .into_iter()
                .map(|kind| (kind, self.spawn_check(kind, request.clone())))
                .collect(),
        };

        handle.join().await
    }

    /// Consumer side of the reachability queue.
    ///
    /// Probes the URL of `message` and applies the same updates as the
    /// in-process check. Safe to call more than once for the same message.
    pub async fn handle_reachability_message(&self, message: ReachabilityMessage) -> CheckReport {
        let request = Arc::new(ValidationRequest::new(message.hash, message.url, None));
        let task = self.spawn_check(CheckKind::Reachability, request);

        let outcome = match task.await {
            Ok(report) => report.outcome,
            Err(e) => {
                tracing::error!(error = %e, "Reachability task panicked");
                CheckOutcome::Error
            }
        };

        CheckReport {
            kind: CheckKind::Reachability,
            outcome,
        }
    }

    /// Signals every in-flight and future check to stop.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
        tracing::info!("Validation checks signalled to stop");
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Resolves once [`Self::shutdown`] has been called.
    pub async fn stopped(&self) {
        let mut shutdown = self.shutdown.subscribe();
        let _ = shutdown.wait_for(|stop| *stop).await;
    }

    fn spawn_check(&self, kind: CheckKind, request: Arc<ValidationRequest>) -> JoinHandle<CheckReport> {
        let checkers = self.checkers.clone();
        let shutdown = self.shutdown.subscribe();

        tokio::spawn(async move {
            let outcome = run_check(&checkers, kind, &request, shutdown).await;
            finish(kind, &request.hash, outcome)
        })
    }

    fn spawn_dispatch(
        &self,
        publisher: Arc<dyn ReachabilityPublisher>,
        request: Arc<ValidationRequest>,
    ) -> JoinHandle<CheckReport> {
        let checkers = self.checkers.clone();
        let shutdown = self.shutdown.subscribe();

        tokio::spawn(async move {
            let kind = CheckKind::Reachability;
            let message = ReachabilityMessage::new(request.hash.clone(), request.url.clone());

            let outcome = match publisher.publish(message).await {
                Ok(()) => CheckOutcome::Dispatched,
                Err(e) => {
                    tracing::warn!(
                        hash = %request.hash,
                        transport = publisher.transport(),
                        error = %e,
                        "Failed to publish reachability job, probing inline"
                    );
                    run_check(&checkers, kind, &request, shutdown).await
                }
            };

            finish(kind, &request.hash, outcome)
        })
    }
}

/// Computes the verdict of one check and records it.
async fn run_check(
    checkers: &Checkers,
    kind: CheckKind,
    request: &ValidationRequest,
    shutdown: watch::Receiver<bool>,
) -> CheckOutcome {
    let Some(finding) = until_shutdown(shutdown, checkers.find(kind, request)).await else {
        return CheckOutcome::Cancelled;
    };

    match checkers.record(&request.hash, finding).await {
        Ok(()) if finding.is_failure() => CheckOutcome::Failed,
        Ok(()) => CheckOutcome::Passed,
        Err(e) => {
            tracing::error!(hash = %request.hash, check = %kind, error = %e, "Failed to record check result");
            CheckOutcome::Error
        }
    }
}

/// Resolves `work` unless shutdown is signalled first.
async fn until_shutdown<F: Future>(mut shutdown: watch::Receiver<bool>, work: F) -> Option<F::Output> {
    if *shutdown.borrow_and_update() {
        return None;
    }

    // A dropped sender means the service is gone, not that it is stopping.
    let signalled = async move {
        if shutdown.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        output = work => Some(output),
        () = signalled => None,
    }
}

fn finish(kind: CheckKind, hash: &str, outcome: CheckOutcome) -> CheckReport {
    let check: &'static str = kind.into();
    let result: &'static str = outcome.into();
    metrics::counter!("validation_checks_total", "check" => check, "result" => result).increment(1);
    tracing::debug!(hash, check, result, "Check finished");

    CheckReport { kind, outcome }
}
