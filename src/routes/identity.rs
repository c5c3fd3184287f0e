use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{error::AppError, state::player::Player};

/// Header carrying the caller's e-mail.
pub const PLAYER_EMAIL_HEADER: &str = "x-player-email";
/// Header carrying the caller's display name.
pub const PLAYER_NAME_HEADER: &str = "x-player-name";

/// Player identified by the `X-Player-Email` and `X-Player-Name` headers.
///
/// The name defaults to the e-mail when absent.
#[derive(Debug, Clone)]
pub struct Caller(pub Player);

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let email = header(parts, PLAYER_EMAIL_HEADER).ok_or_else(|| {
            AppError::Unauthorized("missing player header `X-Player-Email`".into())
        })?;
        let name = header(parts, PLAYER_NAME_HEADER).unwrap_or(email);
        Ok(Caller(Player::new(name, email)))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn extract(request: Request<()>) -> Result<Caller, AppError> {
        let (mut parts, _) = request.into_parts();
        Caller::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_name_and_email() {
        let request = Request::builder()
            .header(PLAYER_EMAIL_HEADER, "pat@x.com")
            .header(PLAYER_NAME_HEADER, "Pat")
            .body(())
            .unwrap();
        let Caller(player) = extract(request).await.unwrap();
        assert_eq!(player, Player::new("Pat", "pat@x.com"));
    }

    #[tokio::test]
    async fn name_defaults_to_email() {
        let request = Request::builder()
            .header(PLAYER_EMAIL_HEADER, "pat@x.com")
            .body(())
            .unwrap();
        let Caller(player) = extract(request).await.unwrap();
        assert_eq!(player.name, "pat@x.com");
    }

    #[tokio::test]
    async fn missing_email_is_unauthorized() {
        let request = Request::builder().body(()).unwrap();
        assert!(matches!(
            extract(request).await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
