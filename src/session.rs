//! The signed-in session, kept in the local store between runs.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::backend::{BackendClient, Session};
use crate::error::{Error, Result};
use crate::storage::{repository, Database};

pub async fn load(db: &Database) -> Result<Option<Session>> {
    db.reader()
        .call(|conn| repository::load_session(conn))
        .await
        .map_err(|e| Error::Database(e.to_string()))
}

pub async fn save(db: &Database, session: &Session) -> Result<()> {
    db.writer()
        .call({
            let session = session.clone();
            move |conn| repository::save_session(conn, &session)
        })
        .await
        .map_err(|e| Error::Database(e.to_string()))
}

/// Returns true if a session was stored.
pub async fn clear(db: &Database) -> Result<bool> {
    db.writer()
        .call(|conn| repository::clear_session(conn))
        .await
        .map_err(|e| Error::Database(e.to_string()))
}

/// Attach the stored session's token to `client`.
///
/// An expired session is renewed with its refresh token and the new session
/// is stored. Without a stored session the client keeps using the anon key.
pub async fn authorize(
    db: &Database,
    client: BackendClient,
    now: DateTime<Utc>,
) -> Result<BackendClient> {
    let session = {
        let client = &client;
        restore(db, now, |token| async move { client.refresh_session(&token).await }).await?
    };
    Ok(match session {
        Some(session) => client.with_access_token(session.access_token),
        None => client,
    })
}

/// Load the stored session, renewing it through `refresh` once it has expired.
///
/// Fails with `Error::Auth` when an expired session has no refresh token.
pub async fn restore<F, Fut>(
    db: &Database,
    now: DateTime<Utc>,
    refresh: F,
) -> Result<Option<Session>>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<Session>>,
{
    let Some(session) = load(db).await? else {
        log::debug!("No stored session");
        return Ok(None);
    };
    if !session.is_expired(now) {
        log::debug!("Using session for {}", session.user.display_name());
        return Ok(Some(session));
    }
    let Some(token) = session.refresh_token.clone().filter(|t| !t.is_empty()) else {
        return Err(Error::Auth(
            "session expired; run `taskdash auth login` again".into(),
        ));
    };
    log::info!("Session for {} expired, refreshing", session.user.display_name());
    let renewed = refresh(token).await?;
    save(db, &renewed).await?;
    Ok(Some(renewed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AuthUser, BackendConfig, UserMetadata};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 14, 30, 0).unwrap()
    }

    fn session(expires_at: DateTime<Utc>) -> Session {
        Session {
            access_token: "jwt".into(),
            refresh_token: None,
            expires_at: Some(expires_at),
            user: AuthUser {
                id: "u1".into(),
                email: None,
                user_metadata: UserMetadata::default(),
            },
        }
    }

    fn client() -> BackendClient {
        BackendClient::new(BackendConfig::new("https://abc.example.co", "anon").unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let db = Database::open_memory().await.unwrap();
        assert!(load(&db).await.unwrap().is_none());

        let s = session(now() + Duration::hours(1));
        save(&db, &s).await.unwrap();
        assert_eq!(load(&db).await.unwrap(), Some(s));

        assert!(clear(&db).await.unwrap());
        assert!(load(&db).await.unwrap().is_none());
        assert!(!clear(&db).await.unwrap());
    }

    #[tokio::test]
    async fn test_authorize() {
        let db = Database::open_memory().await.unwrap();
        let c = authorize(&db, client(), now()).await.unwrap();
        assert_eq!(c.access_token(), None);

        save(&db, &session(now() + Duration::hours(1))).await.unwrap();
        let c = authorize(&db, client(), now()).await.unwrap();
        assert_eq!(c.access_token(), Some("jwt"));
    }

    #[tokio::test]
    async fn test_expired_session_is_refreshed_and_saved() {
        let db = Database::open_memory().await.unwrap();
        let mut expired = session(now() - Duration::minutes(1));
        expired.refresh_token = Some("r1".into());
        save(&db, &expired).await.unwrap();

        let renewed = restore(&db, now(), |token| async move {
            assert_eq!(token, "r1");
            let mut s = session(now() + Duration::hours(1));
            s.access_token = "jwt2".into();
            s.refresh_token = Some("r2".into());
            Ok(s)
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(renewed.access_token, "jwt2");

        let stored = load(&db).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("r2"));
        assert!(!stored.is_expired(now()));
    }

    #[tokio::test]
    async fn test_valid_session_is_not_refreshed() {
        let db = Database::open_memory().await.unwrap();
        save(&db, &session(now() + Duration::minutes(5))).await.unwrap();
        let s = restore(&db, now(), |_| async { Err(Error::Auth("unexpected refresh".into())) })
            .await
            .unwrap();
        assert_eq!(s.map(|s| s.access_token), Some("jwt".to_string()));
    }

    #[tokio::test]
    async fn test_expired_session_without_refresh_token() {
        let db = Database::open_memory().await.unwrap();
        save(&db, &session(now() - Duration::minutes(1))).await.unwrap();
        let err = authorize(&db, client(), now()).await.unwrap_err();
        assert!(matches!(err, Error::Auth(ref m) if m.contains("expired")));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stored_session() {
        let db = Database::open_memory().await.unwrap();
        let mut expired = session(now() - Duration::minutes(1));
        expired.refresh_token = Some("revoked".into());
        save(&db, &expired).await.unwrap();

        let err = restore(&db, now(), |_| async {
            Err(Error::Api {
                status: 400,
                message: "Invalid Refresh Token".into(),
            })
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Api { status: 400, .. }));
        assert_eq!(load(&db).await.unwrap(), Some(expired));
    }
}
