use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::Caller;
use crate::db::Database;
use crate::format::{now_timestamp, parse_timestamp};
use crate::models::*;
use crate::validate::{is_falsy, Entity};

// ============================================================
// Error Handling
// ============================================================

/// Error body returned to clients: `{"message": "..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
}

fn bad_request(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, message)
}

fn not_found(message: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, message)
}

/// Log an internal error and return a sanitized response to the client.
fn internal_error(e: impl std::fmt::Display) -> ApiError {
    tracing::error!("Internal error: {:#}", e);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::warn!("Rejected request body: {}", e);
        bad_request("Invalid request body")
    })
}

/// Reject a record that would not pass validation when read back.
fn check_shape<T: Entity + Serialize>(entity: &T) -> Result<(), ApiError> {
    let value = serde_json::to_value(entity).map_err(internal_error)?;
    T::parse(&value)
        .map(|_| ())
        .map_err(|e| bad_request(format!("Invalid {}: {}", T::KIND, e)))
}

fn require_goal(db: &Database, caller: &Caller, goal_id: &str) -> Result<Goal, ApiError> {
    db.get_goal(&caller.user_id, goal_id)
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Goal not found"))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Users
// ============================================================

pub async fn get_current_user(
    State(db): State<Database>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<User>, ApiError> {
    db.get_user(&caller.user_id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("User not found"))
}

pub async fn get_user(
    State(db): State<Database>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    db.get_user(&user_id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("User not found"))
}

/// Update the caller's profile, creating it on first write when an email is given.
pub async fn update_current_user(
    State(db): State<Database>,
    Extension(caller): Extension<Caller>,
    body: Bytes,
) -> Result<Json<User>, ApiError> {
    let input: UpdateUserInput = parse_body(&body)?;
    let now = now_timestamp();

    let user = match db.get_user(&caller.user_id).map_err(internal_error)? {
        Some(existing) => existing.apply(input, &now),
        None => {
            let email = input.email.ok_or_else(|| not_found("User not found"))?;
            User {
                user_id: caller.user_id.clone(),
                email,
                display_name: input.display_name,
                created_at: now.clone(),
                updated_at: Some(now),
            }
        }
    };

    check_shape(&user)?;
    db.put_user(&user).map_err(internal_error)?;
    Ok(Json(user))
}

// ============================================================
// Goals
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ListGoalsQuery {
    pub category: Option<String>,
}

pub async fn list_goals(
    State(db): State<Database>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<ListGoalsQuery>,
) -> Result<Json<Vec<Goal>>, ApiError> {
    let goals = match query.category {
        Some(category) => db.list_goals_by_category(&caller.user_id, &category),
        None => db.list_goals(&caller.user_id),
    };
    goals.map(Json).map_err(internal_error)
}

pub async fn get_goal(
    State(db): State<Database>,
    Extension(caller): Extension<Caller>,
    Path(goal_id): Path<String>,
) -> Result<Json<Goal>, ApiError> {
    require_goal(&db, &caller, &goal_id).map(Json)
}

/// Create a goal for the caller.
///
/// `title`, `targetValue` and `unit` must be present and truthy. The store
/// assigns the id, starts `currentValue` at 0, marks the goal active and
/// stamps both timestamps.
pub async fn create_goal(
    State(db): State<Database>,
    Extension(caller): Extension<Caller>,
    body: Bytes,
) -> Result<(StatusCode, Json<Goal>), ApiError> {
    let body: Value = parse_body(&body)?;
    let field = |name: &str| body.get(name).filter(|v| !is_falsy(v));

    let (Some(title), Some(target_value), Some(unit)) =
        (field("title"), field("targetValue"), field("unit"))
    else {
        return Err(bad_request("Missing required fields"));
    };

    let title = title
        .as_str()
        .ok_or_else(|| bad_request("title must be a string"))?;
    let unit = unit
        .as_str()
        .ok_or_else(|| bad_request("unit must be a string"))?;
    let target_value =
        to_number(target_value).ok_or_else(|| bad_request("targetValue must be a number"))?;
    let optional = |name: &str| field(name).and_then(Value::as_str).map(str::to_string);

    let deadline = optional("deadline");
    if let Some(ref deadline) = deadline {
        if parse_timestamp(deadline).is_none() {
            return Err(bad_request("deadline must be a valid date"));
        }
    }

    let now = now_timestamp();
    let goal = Goal {
        goal_id: Uuid::new_v4().to_string(),
        user_id: caller.user_id,
        title: title.to_string(),
        description: optional("description"),
        target_value,
        current_value: 0.0,
        unit: unit.to_string(),
        deadline,
        category: optional("category"),
        status: Some(STATUS_ACTIVE.to_string()),
        created_at: now.clone(),
        updated_at: now,
    };

    db.put_goal(&goal).map_err(internal_error)?;
    tracing::info!(goal_id = %goal.goal_id, "Created goal");
    Ok((StatusCode::CREATED, Json(goal)))
}

/// Numbers pass through; numeric strings are converted.
fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

pub async fn update_goal(
    State(db): State<Database>,
    Extension(caller): Extension<Caller>,
    Path(goal_id): Path<String>,
    body: Bytes,
) -> Result<Json<Goal>, ApiError> {
    let input: UpdateGoalInput = parse_body(&body)?;
    let existing = require_goal(&db, &caller, &goal_id)?;
    let goal = existing.apply(input, &now_timestamp());

    check_shape(&goal)?;
    db.put_goal(&goal).map_err(internal_error)?;
    Ok(Json(goal))
}

pub async fn delete_goal(
    State(db): State<Database>,
    Extension(caller): Extension<Caller>,
    Path(goal_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if db
        .delete_goal(&caller.user_id, &goal_id)
        .map_err(internal_error)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Goal not found"))
    }
}

// ============================================================
// Logs
// ============================================================

pub async fn list_logs(
    State(db): State<Database>,
    Extension(caller): Extension<Caller>,
    Path(goal_id): Path<String>,
) -> Result<Json<Vec<Log>>, ApiError> {
    require_goal(&db, &caller, &goal_id)?;
    db.list_logs(&goal_id).map(Json).map_err(internal_error)
}

pub async fn create_log(
    State(db): State<Database>,
    Extension(caller): Extension<Caller>,
    Path(goal_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Log>), ApiError> {
    let input: CreateLogInput = parse_body(&body)?;
    let goal = require_goal(&db, &caller, &goal_id)?;
    let now = now_timestamp();

    let log = Log {
        log_id: Uuid::new_v4().to_string(),
        goal_id: goal.goal_id,
        user_id: caller.user_id,
        value: input.value,
        notes: input.notes.filter(|n| !n.is_empty()),
        timestamp: input.timestamp.unwrap_or_else(|| now.clone()),
        created_at: now,
    };

    check_shape(&log)?;
    db.put_log(&log).map_err(internal_error)?;
    Ok((StatusCode::CREATED, Json(log)))
}

pub async fn update_log(
    State(db): State<Database>,
    Extension(caller): Extension<Caller>,
    Path((goal_id, log_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Log>, ApiError> {
    let input: UpdateLogInput = parse_body(&body)?;
    require_goal(&db, &caller, &goal_id)?;
    let existing = db
        .get_log(&goal_id, &log_id)
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Log not found"))?;
    let log = existing.apply(input);

    check_shape(&log)?;
    db.put_log(&log).map_err(internal_error)?;
    Ok(Json(log))
}

pub async fn delete_log(
    State(db): State<Database>,
    Extension(caller): Extension<Caller>,
    Path((goal_id, log_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    require_goal(&db, &caller, &goal_id)?;
    if db.delete_log(&goal_id, &log_id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Log not found"))
    }
}
