//! Validation state of a short URL and the severity-merge policy.
//!
//! Every validation field is ordered by a *rank*. A stored value may only be
//! replaced by a value of strictly higher rank. The block field is the one
//! exception: it is fed by two checks, so its merge also combines their
//! partial successes (see [`BlockState::merge`]). Either way the checkers
//! can rely on three properties:
//!
//! - a recorded failure is never downgraded to success,
//! - re-applying the same update is a no-op (idempotence),
//! - the order in which sibling checks finish does not matter.
//!
//! Repositories implement these comparisons as conditional updates; the
//! `merge`/`rank`/`severity` functions here are the single source of truth
//! for them.

use serde::Serialize;
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Result of the block-list checks (destination URL and submitter IP).
///
/// The two lists are checked by separate tasks that share this field.
/// `OkUrl` and `OkIp` record that one list passed while the other has not
/// reported yet; the field only becomes `Ok` once both have passed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsRefStr, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockState {
    NotDone,
    OkUrl,
    OkIp,
    FailBlockUrl,
    FailBlockIp,
    Ok,
}

impl BlockState {
    pub fn is_failure(self) -> bool {
        matches!(self, BlockState::FailBlockUrl | BlockState::FailBlockIp)
    }

    /// Whether both lists have reported.
    pub fn is_settled(self) -> bool {
        self == BlockState::Ok || self.is_failure()
    }

    /// Public form of the state: a single passed list still reads `NotDone`.
    pub fn reported(self) -> BlockState {
        match self {
            BlockState::OkUrl | BlockState::OkIp => BlockState::NotDone,
            state => state,
        }
    }

    /// Returns the state that results from merging `incoming` into `self`.
    ///
    /// A recorded failure is final and the first one wins. Otherwise a
    /// failure replaces any success, and the two partial successes combine
    /// into `Ok`, whichever arrives first.
    pub fn merge(self, incoming: BlockState) -> BlockState {
        match (self, incoming) {
            (stored, _) if stored.is_failure() => stored,
            (_, incoming) if incoming.is_failure() => incoming,
            (BlockState::Ok, _) | (_, BlockState::Ok) => BlockState::Ok,
            (BlockState::OkUrl, BlockState::OkIp) | (BlockState::OkIp, BlockState::OkUrl) => {
                BlockState::Ok
            }
            (BlockState::NotDone, incoming) => incoming,
            (stored, _) => stored,
        }
    }
}

/// Result of the reachability probe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsRefStr, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReachableState {
    NotDone,
    FailNotReachable,
    Reachable,
}

impl ReachableState {
    /// Merge rank: `NotDone` < `Reachable` < `FailNotReachable`.
    pub fn rank(self) -> i16 {
        match self {
            ReachableState::NotDone => 0,
            ReachableState::Reachable => 1,
            ReachableState::FailNotReachable => 2,
        }
    }

    pub fn is_failure(self) -> bool {
        self == ReachableState::FailNotReachable
    }

    pub fn merge(self, incoming: ReachableState) -> ReachableState {
        if incoming.rank() > self.rank() {
            incoming
        } else {
            self
        }
    }
}

/// Result of the threat-intelligence lookup.
///
/// `NotDone` is optimistic: the record reports `safe = true` until a lookup
/// says otherwise.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsRefStr, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyState {
    NotDone,
    Safe,
    Unsafe,
}

impl SafetyState {
    pub fn from_safe(safe: bool) -> Self {
        if safe {
            SafetyState::Safe
        } else {
            SafetyState::Unsafe
        }
    }

    pub fn rank(self) -> i16 {
        match self {
            SafetyState::NotDone => 0,
            SafetyState::Safe => 1,
            SafetyState::Unsafe => 2,
        }
    }

    pub fn is_safe(self) -> bool {
        self != SafetyState::Unsafe
    }

    pub fn merge(self, incoming: SafetyState) -> SafetyState {
        if incoming.rank() > self.rank() {
            incoming
        } else {
            self
        }
    }
}

/// HTTP status used when serving a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u16")]
pub struct RedirectMode(u16);

impl RedirectMode {
    /// Default mode: 307 Temporary Redirect.
    pub const TEMPORARY_REDIRECT: RedirectMode = RedirectMode(307);
    /// Reachability failure.
    pub const BAD_REQUEST: RedirectMode = RedirectMode(400);
    /// Block-list or safety failure.
    pub const FORBIDDEN: RedirectMode = RedirectMode(403);

    pub fn new(code: u16) -> Self {
        RedirectMode(code)
    }

    pub fn code(self) -> u16 {
        self.0
    }

    /// Severity used by the merge policy: 403 > 400 > everything else.
    pub fn severity(self) -> i16 {
        match self.0 {
            403 => 2,
            400 => 1,
            _ => 0,
        }
    }

    pub fn is_redirect(self) -> bool {
        (300..400).contains(&self.0)
    }

    pub fn merge(self, incoming: RedirectMode) -> RedirectMode {
        if incoming.severity() > self.severity() {
            incoming
        } else {
            self
        }
    }
}

impl Default for RedirectMode {
    fn default() -> Self {
        RedirectMode::TEMPORARY_REDIRECT
    }
}

impl From<RedirectMode> for u16 {
    fn from(mode: RedirectMode) -> Self {
        mode.0
    }
}

/// Single tagged view of the validation fields of a record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsRefStr, Display, IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationOutcome {
    Pending,
    Ok,
    BlockedUrl,
    BlockedIp,
    Unsafe,
    Unreachable,
}

impl ValidationOutcome {
    /// Collapses the per-check fields into one outcome.
    ///
    /// Precedence: block failures, then safety, then reachability. Without
    /// any failure the outcome is `Pending` until every check has reported.
    pub fn from_states(
        block: BlockState,
        reachable: ReachableState,
        safety: SafetyState,
    ) -> ValidationOutcome {
        match (block, safety, reachable) {
            (BlockState::FailBlockUrl, _, _) => ValidationOutcome::BlockedUrl,
            (BlockState::FailBlockIp, _, _) => ValidationOutcome::BlockedIp,
            (_, SafetyState::Unsafe, _) => ValidationOutcome::Unsafe,
            (_, _, ReachableState::FailNotReachable) => ValidationOutcome::Unreachable,
            (block, _, _) if !block.is_settled() => ValidationOutcome::Pending,
            (_, SafetyState::NotDone, _)
            | (_, _, ReachableState::NotDone) => ValidationOutcome::Pending,
            _ => ValidationOutcome::Ok,
        }
    }

    pub fn is_failure(self) -> bool {
        !matches!(self, ValidationOutcome::Pending | ValidationOutcome::Ok)
    }

    /// Label used in bulk-import reports.
    pub fn report_label(self) -> &'static str {
        match self {
            ValidationOutcome::Ok => "OK",
            ValidationOutcome::Pending => "ERROR: VALIDATION_IN_PROGRESS",
            ValidationOutcome::BlockedUrl => "ERROR: VALIDATION_FAIL_BLOCK_URL",
            ValidationOutcome::BlockedIp => "ERROR: VALIDATION_FAIL_BLOCK_IP",
            ValidationOutcome::Unsafe => "ERROR: VALIDATION_FAIL_NOT_SAFE",
            ValidationOutcome::Unreachable => "ERROR: VALIDATION_FAIL_NOT_REACHABLE",
        }
    }

    /// Human-readable description returned by the creation endpoint.
    pub fn description(self) -> Option<&'static str> {
        match self {
            ValidationOutcome::Pending | ValidationOutcome::Ok => None,
            ValidationOutcome::BlockedUrl => Some("Destination URL is blocked"),
            ValidationOutcome::BlockedIp => Some("Creator IP is blocked"),
            ValidationOutcome::Unsafe => Some("Destination URL is not safe"),
            ValidationOutcome::Unreachable => Some("Destination URL is not reachable"),
        }
    }
}
