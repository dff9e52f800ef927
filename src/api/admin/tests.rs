use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

#[tokio::test]
#[ignore = "needs local postgres and redis"]
async fn admin_area_is_guarded_by_policy() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let admin = test_support::insert_user(db, "admin@example.com", "password-1", test_support::ADMIN).await;
    let educator =
        test_support::insert_user(db, "educator@example.com", "password-2", test_support::EDUCATOR).await;

    let admin_token = test_support::bearer_token(admin.id, ctx.state.settings());
    let educator_token = test_support::bearer_token(educator.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/admin/users",
            Some(&educator_token),
            None,
        ))
        .await
        .expect("educator list");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let denied = test_support::read_json(response).await;
    assert_eq!(denied["detail"], "Forbidden resource");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/admin/users",
            Some(&admin_token),
            None,
        ))
        .await
        .expect("admin list");
    assert_eq!(response.status(), StatusCode::OK);
    let listed = test_support::read_json(response).await;
    assert_eq!(listed["total_count"], 2);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/admin/users?skip=-3&limit=5000",
            Some(&admin_token),
            None,
        ))
        .await
        .expect("out of range page");
    assert_eq!(response.status(), StatusCode::OK);
    let listed = test_support::read_json(response).await;
    assert_eq!(listed["skip"], 0);
    assert_eq!(listed["limit"], 1000);
    assert_eq!(listed["items"].as_array().map(Vec::len), Some(2));

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/admin/users/{}", educator.id),
            Some(&admin_token),
            Some(json!({"is_educator": false, "is_active": false})),
        ))
        .await
        .expect("admin update");
    let status = response.status();
    let updated = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {updated}");
    assert_eq!(updated["is_educator"], false);
    assert_eq!(updated["is_active"], false);
}

#[tokio::test]
#[ignore = "needs local postgres and redis"]
async fn admin_cannot_demote_themselves() {
    let ctx = test_support::setup_test_context().await;
    let admin =
        test_support::insert_user(ctx.state.db(), "root@example.com", "password-1", test_support::ADMIN)
            .await;
    let token = test_support::bearer_token(admin.id, ctx.state.settings());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/admin/users/{}", admin.id),
            Some(&token),
            Some(json!({"is_admin": false})),
        ))
        .await
        .expect("self demote");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "needs local postgres and redis"]
async fn admin_removes_enrollment() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let admin = test_support::insert_user(db, "admin@example.com", "password-1", test_support::ADMIN).await;
    let student =
        test_support::insert_user(db, "student@example.com", "password-2", test_support::PLAIN).await;
    let exam = test_support::insert_published_exam(db, admin.id, "Geometry").await;

    let student_token = test_support::bearer_token(student.id, ctx.state.settings());
    let admin_token = test_support::bearer_token(admin.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{}/enrollments", exam.id),
            Some(&student_token),
            None,
        ))
        .await
        .expect("enroll");
    assert_eq!(response.status(), StatusCode::CREATED);
    let enrollment = test_support::read_json(response).await;
    let enrollment_id = enrollment["id"].as_i64().expect("enrollment id");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/admin/enrollments?exam_id={}", exam.id),
            Some(&admin_token),
            None,
        ))
        .await
        .expect("admin enrollments");
    let listed = test_support::read_json(response).await;
    assert_eq!(listed["total_count"], 1);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/admin/enrollments/{enrollment_id}"),
            Some(&admin_token),
            None,
        ))
        .await
        .expect("delete enrollment");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
