use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::api::errors::ApiError;
use crate::authz::{
    build_ability, evaluate, Ability, Action, Policies, Principal, Subject, SubjectType,
};
use crate::core::metrics::record_authz_decision;

/// Route-group guard. Attach with
/// `route_layer(middleware::from_fn_with_state(policies, check_policies))`.
///
/// Anonymous requests are rejected without building an ability. On success
/// the built ability is stored in request extensions for `CurrentAbility`.
pub(crate) async fn check_policies(
    State(policies): State<Policies>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(principal) = request.extensions().get::<Principal>().copied() else {
        record_authz_decision(false);
        tracing::info!(policies = ?policies, path = %request.uri().path(), "Anonymous request denied");
        return Err(ApiError::Forbidden("Forbidden resource"));
    };

    let ability = build_ability(&principal);
    tracing::debug!(user_id = principal.id, rules = ability.rules().len(), "Ability built");
    let allowed = evaluate(&ability, &policies).await;
    record_authz_decision(allowed);

    if !allowed {
        tracing::info!(
            user_id = principal.id,
            policies = ?policies,
            path = %request.uri().path(),
            "Policy check denied"
        );
        return Err(ApiError::Forbidden("Forbidden resource"));
    }

    request.extensions_mut().insert(Arc::new(ability));
    Ok(next.run(request).await)
}

/// Instance-level check for handlers, counted like guard decisions.
pub(crate) fn authorize<S: Subject + ?Sized>(
    ability: &Ability,
    action: Action,
    subject: &S,
) -> Result<(), ApiError> {
    let allowed = ability.can(action, subject);
    record_authz_decision(allowed);

    if allowed {
        return Ok(());
    }

    tracing::info!(
        action = ?action,
        subject = subject.subject_type().map(SubjectType::as_str),
        "Inline authorization denied"
    );
    Err(ApiError::Forbidden("Forbidden resource"))
}

/// Error for a row lookup that came back empty.
///
/// Callers without a type-wide grant for `action` get the same 403 an existing
/// row would have produced, so ids of drafts and other users stay opaque.
pub(crate) fn missing(
    ability: &Ability,
    action: Action,
    subject_type: SubjectType,
    detail: &str,
) -> ApiError {
    match authorize(ability, action, &subject_type) {
        Ok(()) => ApiError::NotFound(detail.to_string()),
        Err(err) => err,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::{middleware, Extension, Router};
    use tower::ServiceExt;

    use super::*;
    use crate::api::guards::CurrentAbility;
    use crate::authz::{AdminAreaPolicy, PolicyHandler};

    struct Failing;

    #[async_trait]
    impl PolicyHandler for Failing {
        async fn handle(&self, _ability: &Ability) -> anyhow::Result<bool> {
            anyhow::bail!("policy lookup failed")
        }
    }

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl PolicyHandler for Counting {
        async fn handle(&self, _ability: &Ability) -> anyhow::Result<bool> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    async fn rule_count(CurrentAbility(ability): CurrentAbility) -> String {
        ability.rules().len().to_string()
    }

    fn guarded(policies: Policies, principal: Option<Principal>) -> Router {
        let router = Router::new()
            .route("/guarded", get(rule_count))
            .route_layer(middleware::from_fn_with_state(policies, check_policies));

        match principal {
            Some(principal) => router.layer(Extension(principal)),
            None => router,
        }
    }

    async fn call(app: Router) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri("/guarded").body(Body::empty()).unwrap())
            .await
            .expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn admin() -> Principal {
        Principal { id: 1, is_admin: true, is_educator: false }
    }

    fn educator() -> Principal {
        Principal { id: 2, is_admin: false, is_educator: true }
    }

    #[tokio::test]
    async fn admin_area_admits_admin_and_shares_ability() {
        let app = guarded(Policies::new().with(AdminAreaPolicy), Some(admin()));
        let (status, body) = call(app).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "1");
    }

    #[tokio::test]
    async fn admin_area_rejects_educator_with_static_message() {
        let app = guarded(Policies::new().with(AdminAreaPolicy), Some(educator()));
        let (status, body) = call(app).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["detail"], "Forbidden resource");
        assert_eq!(json["status"], 403);
    }

    #[tokio::test]
    async fn anonymous_is_rejected_before_any_handler_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = guarded(Policies::new().with(Counting(calls.clone())), None);
        let (status, _) = call(app).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_policy_list_allows_any_principal() {
        let plain = Principal { id: 3, is_admin: false, is_educator: false };
        let (status, body) = call(guarded(Policies::new(), Some(plain))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "2");
    }

    #[tokio::test]
    async fn failing_handler_denies_even_for_admin() {
        let policies = Policies::new().with(|_: &Ability| true).with(Failing);
        let (status, _) = call(guarded(policies, Some(admin()))).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn closure_policy_sees_principal_rules() {
        let policies = Policies::new()
            .with(|ability: &Ability| ability.can(Action::Manage, &SubjectType::User));

        let (status, _) = call(guarded(policies.clone(), Some(admin()))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(guarded(policies, Some(educator()))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn inline_authorize_maps_denial_to_forbidden() {
        let ability = build_ability(&educator());
        let own_draft =
            serde_json::json!({"kind": "Exam", "id": 1, "ownerId": 2, "isPublished": false});
        let foreign_draft =
            serde_json::json!({"kind": "Exam", "id": 2, "ownerId": 5, "isPublished": false});

        assert!(authorize(&ability, Action::Delete, &own_draft).is_ok());
        let err = authorize(&ability, Action::Read, &foreign_draft).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden("Forbidden resource")));
    }

    #[test]
    fn missing_rows_look_forbidden_without_type_grant() {
        let educator = build_ability(&educator());
        let err = missing(&educator, Action::Read, SubjectType::Exam, "Exam not found");
        assert!(matches!(err, ApiError::Forbidden("Forbidden resource")));

        let admin = build_ability(&admin());
        let err = missing(&admin, Action::Read, SubjectType::Exam, "Exam not found");
        assert!(matches!(err, ApiError::NotFound(ref detail) if detail == "Exam not found"));

        let err = missing(&admin, Action::Manage, SubjectType::User, "User not found");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
