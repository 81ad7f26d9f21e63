use serde::{Deserialize, Serialize};
use time::Duration;
use uuid::Uuid;

use crate::db::complaint_repository::ComplaintScope;
use crate::models::user::User;

/// Sessions last a week by default; "remember me" stretches that to a month.
pub const SESSION_TTL: Duration = Duration::days(7);
pub const REMEMBER_SESSION_TTL: Duration = Duration::days(30);

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub exp: usize, // expiration (as UNIX timestamp)
}

impl Claims {
    pub fn for_user(user: &User, ttl: Duration) -> Self {
        let exp = time::OffsetDateTime::now_utc() + ttl;
        Claims {
            sub: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_staff: user.is_staff,
            exp: exp.unix_timestamp() as usize,
        }
    }

    /// Visibility for complaint queries: staff see everything, everyone else
    /// only what they filed.
    pub fn scope(&self) -> ComplaintScope {
        if self.is_staff {
            ComplaintScope::All
        } else {
            ComplaintScope::CreatedBy(self.sub)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn user(is_staff: bool) -> User {
        User {
            id: Uuid::new_v4(),
            username: "jdoe".into(),
            email: "jdoe@example.com".into(),
            password_hash: "hash".into(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            is_staff,
            is_active: true,
            date_joined: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn staff_claims_scope_to_all() {
        let claims = Claims::for_user(&user(true), SESSION_TTL);
        assert_eq!(claims.scope(), ComplaintScope::All);
    }

    #[test]
    fn non_staff_claims_scope_to_own_complaints() {
        let u = user(false);
        let claims = Claims::for_user(&u, SESSION_TTL);
        assert_eq!(claims.scope(), ComplaintScope::CreatedBy(u.id));
    }

    #[test]
    fn expiry_tracks_requested_ttl() {
        let claims = Claims::for_user(&user(false), REMEMBER_SESSION_TTL);
        let expected = (OffsetDateTime::now_utc() + REMEMBER_SESSION_TTL).unix_timestamp();
        let drift = (claims.exp as i64 - expected).abs();
        assert!(drift <= 2, "exp drifted by {drift}s");
    }
}
