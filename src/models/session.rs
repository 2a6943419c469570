use chrono::{DateTime, Utc};

/// Represents a login session.
///
/// The raw token is only ever held by the client. The store keys sessions
/// by the SHA-256 digest of the token.
#[derive(Debug, Clone)]
pub struct Session {
    /// The ID of the user this session belongs to.
    pub user_id: i64,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// A session is usable at any instant strictly before `expires_at`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// A freshly created session together with the token handed to the client.
pub struct IssuedSession {
    pub token: String,
    pub session: Session,
}

impl std::fmt::Debug for IssuedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedSession")
            .field("token", &"<redacted>")
            .field("session", &self.session)
            .finish()
    }
}
