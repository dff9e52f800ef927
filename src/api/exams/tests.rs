use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::test_support::{self, ADMIN, EDUCATOR, PLAIN};

#[tokio::test]
#[ignore = "needs local postgres and redis"]
async fn educator_builds_and_publishes_exam() {
    let ctx = test_support::setup_test_context().await;
    let educator =
        test_support::insert_user(ctx.state.db(), "educator@example.com", "password-1", EDUCATOR).await;
    let token = test_support::bearer_token(educator.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&token),
            Some(json!({"title": "Algebra", "durationMinutes": 45})),
        ))
        .await
        .expect("create exam");
    let status = response.status();
    let exam = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {exam}");
    assert_eq!(exam["owner_id"], educator.id);
    assert_eq!(exam["is_published"], false);
    let exam_id = exam["id"].as_i64().expect("exam id");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/publish"),
            Some(&token),
            None,
        ))
        .await
        .expect("publish empty");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/sections"),
            Some(&token),
            Some(json!({"title": "Part A"})),
        ))
        .await
        .expect("create section");
    assert_eq!(response.status(), StatusCode::CREATED);
    let section = test_support::read_json(response).await;
    let section_id = section["id"].as_i64().expect("section id");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/sections/{section_id}/questions"),
            Some(&token),
            Some(json!({"prompt": "1 + 1", "options": ["1", "2"], "correct_option": 5})),
        ))
        .await
        .expect("invalid question");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/sections/{section_id}/questions"),
            Some(&token),
            Some(json!({"prompt": "1 + 1", "options": ["1", "2"], "correct_option": 1})),
        ))
        .await
        .expect("create question");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/publish"),
            Some(&token),
            None,
        ))
        .await
        .expect("publish");
    let status = response.status();
    let published = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {published}");
    assert_eq!(published["is_published"], true);
    assert!(published["published_at"].is_string());
}

#[tokio::test]
#[ignore = "needs local postgres and redis"]
async fn plain_user_sees_only_published_exams() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let educator = test_support::insert_user(db, "educator@example.com", "password-1", EDUCATOR).await;
    let student = test_support::insert_user(db, "student@example.com", "password-2", PLAIN).await;
    let draft = test_support::insert_exam(db, educator.id, "Draft").await;
    let published = test_support::insert_published_exam(db, educator.id, "Published").await;
    let token = test_support::bearer_token(student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams/{}", draft.id),
            Some(&token),
            None,
        ))
        .await
        .expect("draft");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams/{}", published.id),
            Some(&token),
            None,
        ))
        .await
        .expect("published");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/exams", Some(&token), None))
        .await
        .expect("list");
    let listed = test_support::read_json(response).await;
    assert_eq!(listed["total_count"], 1);
    assert_eq!(listed["items"][0]["id"], published.id);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/exams/{}", published.id),
            Some(&token),
            None,
        ))
        .await
        .expect("delete");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/exams/999999",
            Some(&token),
            None,
        ))
        .await
        .expect("missing");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = test_support::insert_user(db, "admin@example.com", "password-3", ADMIN).await;
    let admin_token = test_support::bearer_token(admin.id, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/exams/999999",
            Some(&admin_token),
            None,
        ))
        .await
        .expect("missing as admin");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "needs local postgres and redis"]
async fn answers_are_hidden_from_readers() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let educator = test_support::insert_user(db, "educator@example.com", "password-1", EDUCATOR).await;
    let student = test_support::insert_user(db, "student@example.com", "password-2", PLAIN).await;
    let exam = test_support::insert_exam(db, educator.id, "Chemistry").await;
    let (section, _question) = test_support::insert_question(db, exam.id).await;
    crate::repositories::exams::publish(db, exam.id, crate::core::time::primitive_now_utc())
        .await
        .expect("publish");

    let uri = format!("/api/v1/exams/{}/sections/{}/questions", exam.id, section.id);

    let owner_token = test_support::bearer_token(educator.id, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &uri, Some(&owner_token), None))
        .await
        .expect("owner questions");
    let owner_view = test_support::read_json(response).await;
    assert_eq!(owner_view[0]["correct_option"], 1);

    let student_token = test_support::bearer_token(student.id, ctx.state.settings());
    let response = ctx
        .app
        .oneshot(test_support::json_request(Method::GET, &uri, Some(&student_token), None))
        .await
        .expect("student questions");
    let student_view = test_support::read_json(response).await;
    assert!(student_view[0].get("correct_option").is_none());
}

#[tokio::test]
#[ignore = "needs local postgres and redis"]
async fn enrollment_requires_published_exam_and_is_unique() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();

    let educator = test_support::insert_user(db, "educator@example.com", "password-1", EDUCATOR).await;
    let student = test_support::insert_user(db, "student@example.com", "password-2", PLAIN).await;
    let draft = test_support::insert_exam(db, educator.id, "Draft").await;
    let published = test_support::insert_published_exam(db, educator.id, "Open").await;
    let token = test_support::bearer_token(student.id, ctx.state.settings());

    let enroll = |exam_id: i64| {
        test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/enrollments"),
            Some(&token),
            None,
        )
    };

    let response = ctx.app.clone().oneshot(enroll(draft.id)).await.expect("draft");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx.app.clone().oneshot(enroll(published.id)).await.expect("first");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = ctx.app.clone().oneshot(enroll(published.id)).await.expect("second");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/enrollments/me",
            Some(&token),
            None,
        ))
        .await
        .expect("mine");
    let mine = test_support::read_json(response).await;
    assert_eq!(mine.as_array().map(Vec::len), Some(1));
    assert_eq!(mine[0]["exam_id"], published.id);
}

fn cover_upload(exam_id: i64, token: &str) -> axum::http::Request<axum::body::Body> {
    let boundary = "examhub-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cover.png\"\r\n\
         Content-Type: image/png\r\n\r\npng-bytes\r\n--{boundary}--\r\n"
    );

    axum::http::Request::builder()
        .method(Method::PUT)
        .uri(format!("/api/v1/exams/{exam_id}/cover"))
        .header(axum::http::header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            axum::http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(axum::body::Body::from(body))
        .expect("request")
}

async fn stored_cover_key(db: &sqlx::PgPool, exam_id: i64) -> String {
    repositories::exams::find_by_id(db, exam_id)
        .await
        .expect("fetch exam")
        .and_then(|exam| exam.cover_image_key)
        .expect("cover key")
}

#[tokio::test]
#[ignore = "needs local postgres and redis"]
async fn cover_upload_without_storage_is_unavailable() {
    let ctx = test_support::setup_test_context().await;
    let educator =
        test_support::insert_user(ctx.state.db(), "educator@example.com", "password-1", EDUCATOR).await;
    let exam = test_support::insert_exam(ctx.state.db(), educator.id, "Art").await;
    let token = test_support::bearer_token(educator.id, ctx.state.settings());

    let response = ctx.app.oneshot(cover_upload(exam.id, &token)).await.expect("upload");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
#[ignore = "needs local postgres and redis"]
async fn cover_write_returns_replaced_key() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let educator = test_support::insert_user(db, "educator@example.com", "password-1", EDUCATOR).await;
    let exam = test_support::insert_exam(db, educator.id, "Art").await;
    let now = primitive_now_utc();

    let first = repositories::exams::set_cover_image(db, exam.id, "exams/1/cover-a.png", now)
        .await
        .expect("first write")
        .expect("exam row");
    assert_eq!(first.previous_cover_image_key, None);
    assert_eq!(first.exam.cover_image_key.as_deref(), Some("exams/1/cover-a.png"));

    let second = repositories::exams::set_cover_image(db, exam.id, "exams/1/cover-b.png", now)
        .await
        .expect("second write")
        .expect("exam row");
    assert_eq!(second.previous_cover_image_key.as_deref(), Some("exams/1/cover-a.png"));
    assert_eq!(second.exam.cover_image_key.as_deref(), Some("exams/1/cover-b.png"));

    let missing = repositories::exams::set_cover_image(db, exam.id + 1000, "exams/x.png", now)
        .await
        .expect("missing write");
    assert!(missing.is_none());

    let deleted_key = repositories::exams::delete_by_id(db, exam.id).await.expect("delete");
    assert_eq!(deleted_key.as_deref(), Some("exams/1/cover-b.png"));
}

#[tokio::test]
#[ignore = "needs local postgres, redis and s3"]
async fn replacing_cover_removes_previous_object() {
    let ctx = test_support::setup_test_context_with_storage().await;
    let db = ctx.state.db();
    let storage = ctx.state.storage().expect("storage").clone();
    let educator = test_support::insert_user(db, "educator@example.com", "password-1", EDUCATOR).await;
    let exam = test_support::insert_exam(db, educator.id, "Art").await;
    let token = test_support::bearer_token(educator.id, ctx.state.settings());

    let response = ctx.app.clone().oneshot(cover_upload(exam.id, &token)).await.expect("first");
    assert_eq!(response.status(), StatusCode::OK);
    let first_key = stored_cover_key(db, exam.id).await;
    assert!(storage.object_exists(&first_key).await.expect("head first"));

    let response = ctx.app.clone().oneshot(cover_upload(exam.id, &token)).await.expect("second");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert!(body["cover_image_url"].is_string());

    let second_key = stored_cover_key(db, exam.id).await;
    assert_ne!(first_key, second_key);
    assert!(!storage.object_exists(&first_key).await.expect("head first"));
    assert!(storage.object_exists(&second_key).await.expect("head second"));

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/exams/{}", exam.id),
            Some(&token),
            None,
        ))
        .await
        .expect("delete");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!storage.object_exists(&second_key).await.expect("head second"));
}
