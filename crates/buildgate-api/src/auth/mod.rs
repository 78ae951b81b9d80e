//! Caller identity.
//!
//! Tokens are issued elsewhere; this module only verifies them and turns the
//! result into an [`Actor`]. A missing or invalid token yields
//! [`Actor::Anonymous`]; whether that is acceptable is for each command to
//! decide.

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::JwtManager;

use buildgate_core::CommandError;

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub login: String,
}

/// Whoever sent the request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Actor {
    #[default]
    Anonymous,
    User(AuthenticatedUser),
}

impl Actor {
    pub fn user(id: i64, login: impl Into<String>) -> Self {
        Self::User(AuthenticatedUser {
            id,
            login: login.into(),
        })
    }

    pub const fn is_logged_in(&self) -> bool {
        matches!(self, Self::User(_))
    }

    pub const fn user_id(&self) -> Option<i64> {
        match self {
            Self::User(u) => Some(u.id),
            Self::Anonymous => None,
        }
    }

    /// The authenticated user, or `LoginRequired`.
    pub const fn require_login(&self) -> Result<&AuthenticatedUser, CommandError> {
        match self {
            Self::User(u) => Ok(u),
            Self::Anonymous => Err(CommandError::LoginRequired),
        }
    }
}

impl TryFrom<Claims> for Actor {
    type Error = std::num::ParseIntError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(Self::user(claims.sub.parse()?, claims.login))
    }
}
