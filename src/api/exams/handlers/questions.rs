use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAbility;
use crate::api::validation::validate_correct_option;
use crate::authz::Action;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::exam::{QuestionCreate, QuestionResponse, QuestionUpdate};

use super::super::helpers;

pub(in crate::api::exams) async fn list_questions(
    Path((exam_id, section_id)): Path<(i64, i64)>,
    CurrentAbility(ability): CurrentAbility,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    let exam = helpers::authorized_exam(&state, &ability, exam_id, Action::Read).await?;
    helpers::fetch_section(&state, exam_id, section_id).await?;

    let include_answers = ability.can(Action::Update, &exam);
    let questions = repositories::questions::list_by_section(state.db(), section_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;

    Ok(Json(
        questions
            .into_iter()
            .map(|question| QuestionResponse::from_db(question, include_answers))
            .collect(),
    ))
}

pub(in crate::api::exams) async fn create_question(
    Path((exam_id, section_id)): Path<(i64, i64)>,
    CurrentAbility(ability): CurrentAbility,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    payload.validate()?;
    validate_correct_option(payload.options.len(), payload.correct_option)?;
    helpers::authorized_exam(&state, &ability, exam_id, Action::Update).await?;
    helpers::fetch_section(&state, exam_id, section_id).await?;

    let question = repositories::questions::create(
        state.db(),
        repositories::questions::CreateQuestion {
            exam_id,
            section_id,
            prompt: payload.prompt.trim(),
            options: payload.options,
            correct_option: payload.correct_option,
            points: payload.points,
            order_index: payload.order_index,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    Ok((StatusCode::CREATED, Json(QuestionResponse::from_db(question, true))))
}

pub(in crate::api::exams) async fn update_question(
    Path((exam_id, question_id)): Path<(i64, i64)>,
    CurrentAbility(ability): CurrentAbility,
    State(state): State<AppState>,
    Json(payload): Json<QuestionUpdate>,
) -> Result<Json<QuestionResponse>, ApiError> {
    payload.validate()?;
    helpers::authorized_exam(&state, &ability, exam_id, Action::Update).await?;

    let Some(current) = repositories::questions::find_in_exam(state.db(), exam_id, question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
    else {
        return Err(ApiError::NotFound("Question not found".to_string()));
    };

    let options_len = payload.options.as_ref().map_or(current.options.0.len(), Vec::len);
    validate_correct_option(options_len, payload.correct_option.or(current.correct_option))?;

    let question = repositories::questions::update(
        state.db(),
        question_id,
        repositories::questions::UpdateQuestion {
            prompt: payload.prompt.map(|prompt| prompt.trim().to_string()),
            options: payload.options,
            correct_option: payload.correct_option,
            points: payload.points,
            order_index: payload.order_index,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update question"))?;

    Ok(Json(QuestionResponse::from_db(question, true)))
}

pub(in crate::api::exams) async fn delete_question(
    Path((exam_id, question_id)): Path<(i64, i64)>,
    CurrentAbility(ability): CurrentAbility,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    helpers::authorized_exam(&state, &ability, exam_id, Action::Update).await?;

    let found = repositories::questions::find_in_exam(state.db(), exam_id, question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?;
    if found.is_none() {
        return Err(ApiError::NotFound("Question not found".to_string()));
    }

    repositories::questions::delete_by_id(state.db(), question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;

    Ok(StatusCode::NO_CONTENT)
}
