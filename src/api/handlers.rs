use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{Course, CourseId, StudentId},
};

use super::AppState;

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Recommended courses for a student
pub async fn student_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(student_id): Path<StudentId>,
) -> AppResult<Json<Vec<Course>>> {
    tracing::info!(request_id = %request_id, student_id, "Processing recommendation request");

    let courses = state.engine.recommend(student_id).await?;

    tracing::info!(
        request_id = %request_id,
        student_id,
        count = courses.len(),
        "Recommendation request completed"
    );

    Ok(Json(courses))
}

/// Courses in the same category as the given course
pub async fn similar_courses(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(course_id): Path<CourseId>,
) -> AppResult<Json<Vec<Course>>> {
    tracing::info!(request_id = %request_id, course_id, "Processing similar courses request");

    let courses = state.engine.similar_courses(course_id).await?;
    Ok(Json(courses))
}
