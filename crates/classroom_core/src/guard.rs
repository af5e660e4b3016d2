//! crates/classroom_core/src/guard.rs
//!
//! The Route Guard keeps the navigable location consistent with the session
//! status. The decision itself is the pure `RouteGuard::evaluate`; `run`
//! drives it from watch channels for embedders with a live navigation stack.

use std::fmt;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::session::{AuthStatus, SessionSnapshot};

//=========================================================================================
// Location
//=========================================================================================

/// A navigation path, normalized to its non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Location {
    segments: Vec<String>,
}

impl Location {
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True when `prefix` names this location or one of its ancestors.
    pub fn starts_with(&self, prefix: &Location) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments.iter().zip(&prefix.segments).all(|(a, b)| a == b)
    }
}

impl From<&str> for Location {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

//=========================================================================================
// Policy
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    #[error("The public area cannot be the root location")]
    RootPublicArea,
    #[error("Sign-in entry {0} lies outside the public area")]
    EntryOutsidePublicArea(Location),
    #[error("Landing location {0} lies inside the public area")]
    LandingInsidePublicArea(Location),
}

/// Where the public area is and where each redirect goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardPolicy {
    public_area: Location,
    sign_in_entry: Location,
    landing: Location,
}

impl GuardPolicy {
    /// The entry must be public and the landing protected, otherwise a
    /// redirect could trigger another redirect.
    pub fn new(
        public_area: Location,
        sign_in_entry: Location,
        landing: Location,
    ) -> Result<Self, GuardError> {
        if public_area.segments.is_empty() {
            return Err(GuardError::RootPublicArea);
        }
        if !sign_in_entry.starts_with(&public_area) {
            return Err(GuardError::EntryOutsidePublicArea(sign_in_entry));
        }
        if landing.starts_with(&public_area) {
            return Err(GuardError::LandingInsidePublicArea(landing));
        }
        Ok(Self {
            public_area,
            sign_in_entry,
            landing,
        })
    }

    pub fn is_public(&self, location: &Location) -> bool {
        location.starts_with(&self.public_area)
    }

    pub fn sign_in_entry(&self) -> &Location {
        &self.sign_in_entry
    }

    pub fn landing(&self) -> &Location {
        &self.landing
    }
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            public_area: Location::parse("/auth"),
            sign_in_entry: Location::parse("/auth/signin"),
            landing: Location::parse("/feed"),
        }
    }
}

//=========================================================================================
// Guard
//=========================================================================================

/// Receives the guard's redirects.
pub trait Navigator: Send + Sync {
    /// Replaces the current location without pushing history.
    fn replace(&self, to: &Location);
}

#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    policy: GuardPolicy,
}

impl RouteGuard {
    pub fn new(policy: GuardPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &GuardPolicy {
        &self.policy
    }

    /// Where `location` must be redirected to, if anywhere.
    pub fn evaluate(&self, status: AuthStatus, location: &Location) -> Option<Location> {
        let public = self.policy.is_public(location);
        match status {
            AuthStatus::Pending => None,
            AuthStatus::Anonymous if !public => Some(self.policy.sign_in_entry.clone()),
            AuthStatus::Authenticated if public => Some(self.policy.landing.clone()),
            AuthStatus::Anonymous | AuthStatus::Authenticated => None,
        }
    }

    /// Re-evaluates on every session or location change until either
    /// channel closes. Repeated observations of the same (status, location)
    /// pair do not redirect twice.
    pub async fn run<N: Navigator>(
        self,
        mut session: watch::Receiver<SessionSnapshot>,
        mut location: watch::Receiver<Location>,
        navigator: N,
    ) {
        let mut last_seen: Option<(AuthStatus, Location)> = None;

        loop {
            let status = session.borrow_and_update().status();
            let here = location.borrow_and_update().clone();
            let observation = (status, here);

            if last_seen.as_ref() != Some(&observation) {
                if let Some(target) = self.evaluate(observation.0, &observation.1) {
                    info!(from = %observation.1, to = %target, ?status, "Redirecting");
                    navigator.replace(&target);
                }
                last_seen = Some(observation);
            }

            tokio::select! {
                changed = session.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = location.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        debug!("Route guard stopped");
    }
}
