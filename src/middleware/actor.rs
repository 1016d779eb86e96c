// src/middleware/actor.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{common::error::AppError, services::workflow::ActorRole};

// Cabeçalho HTTP com o papel de quem está agindo
const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Papel do ator da requisição. A autenticação fica na borda, fora deste serviço.
#[derive(Debug, Clone, Copy)]
pub struct ActorContext(pub ActorRole);

impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ACTOR_ROLE_HEADER)
            .ok_or_else(|| AppError::InvalidActorRole("cabeçalho ausente".to_string()))?;

        let value = value
            .to_str()
            .map_err(|_| AppError::InvalidActorRole("caracteres inválidos".to_string()))?;

        match value.parse::<ActorRole>().map_err(AppError::InvalidActorRole)? {
            // Reservado ao worker de lotes
            ActorRole::System => Err(AppError::InvalidActorRole("papel reservado: system".to_string())),
            role => Ok(ActorContext(role)),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn extract(header: Option<&str>) -> Result<ActorContext, AppError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(ACTOR_ROLE_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        ActorContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_the_role_header() {
        let actor = extract(Some(" Reviewer ")).await.unwrap();
        assert_eq!(actor.0, ActorRole::Reviewer);
    }

    #[tokio::test]
    async fn rejects_missing_unknown_and_reserved_roles() {
        for header in [None, Some("admin"), Some("system")] {
            let err = extract(header).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidActorRole(_)), "{header:?}");
        }
    }
}
