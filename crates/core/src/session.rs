//! Session lifecycle.
//!
//! A session moves through
//! `Unauthenticated -> Authenticating -> Authenticated(profile) -> SigningOut
//! -> Unauthenticated`. The API layer builds an `Authenticated` value per
//! request from the bearer token and a freshly loaded profile row; the
//! auth handlers drive the sign-in and sign-out transitions explicitly.

use serde::Serialize;

use crate::error::CoreError;
use crate::roles::{ROLE_ADMIN, USER_TYPE_AGENT};
use crate::types::DbId;

/// The identity facts a session carries about the signed-in profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionProfile {
    pub profile_id: DbId,
    pub user_id: DbId,
    pub email: String,
    pub user_type: String,
    pub role: String,
}

impl SessionProfile {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn is_agent(&self) -> bool {
        self.user_type == USER_TYPE_AGENT
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "profile", rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated(SessionProfile),
    SigningOut,
}

/// Inputs that move a [`SessionState`] forward.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    SignInStarted,
    SignInSucceeded(SessionProfile),
    SignInFailed,
    /// The profile row changed (or was re-fetched) while signed in.
    ProfileRefreshed(SessionProfile),
    SignOutStarted,
    SignOutCompleted,
}

impl SessionState {
    /// Apply `event`, returning the next state.
    ///
    /// Illegal transitions (for example signing out while unauthenticated)
    /// are rejected with [`CoreError::Conflict`].
    pub fn transition(self, event: SessionEvent) -> Result<SessionState, CoreError> {
        use SessionEvent as E;
        use SessionState as S;

        match (self, event) {
            (S::Unauthenticated, E::SignInStarted) => Ok(S::Authenticating),
            (S::Authenticating, E::SignInSucceeded(profile)) => Ok(S::Authenticated(profile)),
            (S::Authenticating, E::SignInFailed) => Ok(S::Unauthenticated),
            (S::Authenticated(current), E::ProfileRefreshed(profile)) => {
                if current.profile_id != profile.profile_id {
                    return Err(CoreError::Conflict(
                        "Refreshed profile belongs to a different identity".into(),
                    ));
                }
                Ok(S::Authenticated(profile))
            }
            (S::Authenticated(_), E::SignOutStarted) => Ok(S::SigningOut),
            (S::SigningOut, E::SignOutCompleted) => Ok(S::Unauthenticated),
            (state, event) => Err(CoreError::Conflict(format!(
                "Invalid session transition from {} on {event:?}",
                state.name()
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticating => "authenticating",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::SigningOut => "signing_out",
        }
    }

    pub fn profile(&self) -> Option<&SessionProfile> {
        match self {
            SessionState::Authenticated(profile) => Some(profile),
            _ => None,
        }
    }
}
