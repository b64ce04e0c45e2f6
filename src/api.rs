//! api.rs — Axum router, shared state, and request handlers.
//!
//! Auth endpoints mirror the `{status, ...}` envelope the SPA frontend
//! expects; core endpoints return plain JSON and signal failures through
//! `ApiError` (`{"detail": ...}`).

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::auth::{self, jwt, AuthError, JwtKeys};
use crate::codescan;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::model::{Id, User};
use crate::recommend::{course_signals, recommend, score_candidate, ScoredCandidate};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub keys: JwtKeys,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let keys = JwtKeys::from_secret(&config.auth.secret);
        Self {
            store: Arc::new(Store::new()),
            keys,
            config: Arc::new(config),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/user/register", post(register))
        .route("/api/user/login", post(login))
        .route("/api/user/refresh", post(refresh_token))
        .route("/api/user/logout", post(logout))
        .route("/api/user/me", get(me))
        .route("/api/user/verify", get(verify))
        .route("/api/students/{id}/overview", get(student_overview))
        .route("/api/students/{id}/recommendation", get(student_recommendation))
        .route("/api/attempts", post(create_attempt))
        .route("/api/courses", get(list_courses))
        .route("/api/courses/{id}", get(course_detail))
        .route("/api/analyze-code", post(analyze_code))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

// ---- authentication ----

/// Authenticated requester, resolved from the `Authorization: Bearer` header.
pub struct AuthUser {
    pub user: User,
    pub student_id: Option<Id>,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            ApiError::Unauthorized("Authentication credentials were not provided.".to_string())
        })?;
        let claims = state
            .keys
            .validate(token, jwt::TOKEN_TYPE_ACCESS)
            .map_err(|e| ApiError::Unauthorized(e.to_string()))?;
        let user = claims
            .sub
            .parse::<Id>()
            .ok()
            .and_then(|id| state.store.user_by_id(id))
            .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))?;
        let student_id = state.store.student_for_user(user.id).map(|s| s.id);
        Ok(AuthUser { user, student_id })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

#[derive(Debug, Serialize)]
struct UserOut {
    id: Id,
    email: String,
    full_name: String,
    student_id: Option<Id>,
}

fn user_out(state: &AppState, user: &User) -> UserOut {
    UserOut {
        id: user.id,
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        student_id: state.store.student_for_user(user.id).map(|s| s.id),
    }
}

fn auth_failure(status: StatusCode, err: &AuthError) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "status": 0, "error": err.to_string() })))
}

#[derive(Debug, Deserialize)]
struct RegisterReq {
    full_name: String,
    email: String,
    password: String,
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterReq>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user = match auth::register(&state.store, &body.full_name, &body.email, &body.password) {
        Ok(user) => user,
        Err(AuthError::Internal(err)) => return Err(ApiError::Internal(err)),
        Err(err) => return Ok(auth_failure(StatusCode::BAD_REQUEST, &err)),
    };
    let pair = auth::token_pair_for(&state.keys, &state.config.auth, &user)
        .map_err(|err| ApiError::Internal(anyhow::anyhow!(err)))?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": 1,
            "message": "User registered successfully",
            "user": user_out(&state, &user),
            "token": pair.access,
            "refresh": pair.refresh,
        })),
    ))
}

#[derive(Debug, Deserialize)]
struct LoginReq {
    email: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginReq>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let user = match auth::login(&state.store, &body.email, &body.password) {
        Ok(user) => user,
        Err(err @ AuthError::InvalidCredentials) => {
            return Ok(auth_failure(StatusCode::UNAUTHORIZED, &err));
        }
        Err(AuthError::Internal(err)) => return Err(ApiError::Internal(err)),
        Err(err) => return Ok(auth_failure(StatusCode::BAD_REQUEST, &err)),
    };
    let pair = auth::token_pair_for(&state.keys, &state.config.auth, &user)
        .map_err(|err| ApiError::Internal(anyhow::anyhow!(err)))?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "status": 1,
            "message": "Login successful",
            "token": pair.access,
            "refresh": pair.refresh,
            "user": user_out(&state, &user),
        })),
    ))
}

#[derive(Debug, Default, Deserialize)]
struct RefreshReq {
    #[serde(default)]
    refresh: Option<String>,
}

async fn refresh_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshReq>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Some(token) = body.refresh else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": 0, "error": "No refresh token provided" })),
        ));
    };
    match auth::refresh(&state.store, &state.keys, &state.config.auth, &token) {
        Ok(pair) => Ok((
            StatusCode::OK,
            Json(json!({ "status": 1, "token": pair.access, "refresh": pair.refresh })),
        )),
        Err(err @ AuthError::InvalidRefreshToken) => {
            Ok(auth_failure(StatusCode::UNAUTHORIZED, &err))
        }
        Err(AuthError::Internal(err)) => Err(ApiError::Internal(err)),
        Err(err) => Ok(auth_failure(StatusCode::BAD_REQUEST, &err)),
    }
}

async fn logout(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(body): Json<RefreshReq>,
) -> Json<Value> {
    if let Some(token) = body.refresh {
        auth::logout(&state.store, &state.keys, &token);
    }
    Json(json!({ "status": 1, "message": "Logged out" }))
}

async fn me(State(state): State<AppState>, auth: AuthUser) -> Json<Value> {
    Json(json!({ "status": 1, "user": user_out(&state, &auth.user) }))
}

/// Token validity probe: always 200, `valid` reflects the Bearer header.
async fn verify(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    let valid = bearer_token(&headers)
        .map(|token| state.keys.validate(token, jwt::TOKEN_TYPE_ACCESS).is_ok())
        .unwrap_or(false);
    Json(json!({ "valid": valid }))
}

// ---- students ----

#[derive(Debug, Serialize)]
struct CourseOverview {
    id: Id,
    name: String,
    description: String,
    difficulty: u8,
    progress: u32,
    last_activity: Option<String>,
    next_up: Option<String>,
}

#[derive(Debug, Serialize)]
struct OverviewResp {
    student: StudentRef,
    courses: Vec<CourseOverview>,
}

#[derive(Debug, Serialize)]
struct StudentRef {
    id: Id,
    name: String,
}

async fn student_overview(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Id>,
) -> Result<Json<OverviewResp>, ApiError> {
    let student = state.store.student_by_id(id).ok_or(ApiError::NotFound)?;
    let courses = state
        .store
        .courses()
        .into_iter()
        .map(|course| {
            let attempts = state.store.attempts_for_course(student.id, course.id);
            let signals = course_signals(&attempts);
            let next_up = state
                .store
                .lessons_for_course(course.id)
                .first()
                .map(|l| l.title.clone());
            CourseOverview {
                id: course.id,
                name: course.name,
                description: course.description,
                difficulty: course.difficulty,
                progress: signals.progress as u32,
                last_activity: signals.last_activity.map(|ts| ts.to_rfc3339()),
                next_up,
            }
        })
        .collect();
    Ok(Json(OverviewResp {
        student: StudentRef {
            id: student.id,
            name: student.name,
        },
        courses,
    }))
}

async fn student_recommendation(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Id>,
) -> Result<Response, ApiError> {
    let student = state.store.student_by_id(id).ok_or(ApiError::NotFound)?;
    let defaults = state.config.recommender.features;
    let weights = state.config.recommender.weights;

    let mut candidates = Vec::new();
    for course in state.store.courses() {
        let attempts = state.store.attempts_for_course(student.id, course.id);
        let signals = course_signals(&attempts);
        let (score, features) = score_candidate(
            signals.progress,
            defaults.recency_gap_days,
            defaults.tag_gap,
            signals.hint_rate,
            &weights,
        )?;
        candidates.push(ScoredCandidate {
            id: course.id.to_string(),
            title: format!("Continue \"{}\" — next lesson", course.name),
            score,
            features,
        });
    }

    match recommend(candidates) {
        Some(result) => Ok(Json(result).into_response()),
        None => Ok(Json(json!({ "detail": "No recommendations available." })).into_response()),
    }
}

// ---- attempts ----

#[derive(Debug, Deserialize)]
struct AttemptReq {
    #[serde(default)]
    student: Option<Id>,
    lesson: Id,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    correctness: f64,
    #[serde(default)]
    hints_used: u32,
    #[serde(default)]
    duration_sec: u32,
}

async fn create_attempt(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<AttemptReq>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if !body.correctness.is_finite() || !(0.0..=1.0).contains(&body.correctness) {
        return Err(ApiError::Validation(
            "Correctness must be between 0 and 1.".to_string(),
        ));
    }
    let student_id = body
        .student
        .or(auth.student_id)
        .ok_or_else(|| ApiError::Validation("Unknown student.".to_string()))?;
    let attempt = state.store.create_attempt(
        student_id,
        body.lesson,
        body.timestamp.unwrap_or_else(Utc::now),
        body.correctness,
        body.hints_used,
        body.duration_sec,
    )?;
    Ok((StatusCode::CREATED, Json(json!({ "id": attempt.id }))))
}

// ---- courses ----

#[derive(Debug, Serialize)]
struct LessonOut {
    id: Id,
    title: String,
    tags: Vec<String>,
    order_index: u32,
}

#[derive(Debug, Serialize)]
struct CourseOut {
    id: Id,
    name: String,
    description: String,
    difficulty: u8,
    lessons: Vec<LessonOut>,
}

fn course_out(state: &AppState, course: crate::model::Course) -> CourseOut {
    let lessons = state
        .store
        .lessons_for_course(course.id)
        .into_iter()
        .map(|l| LessonOut {
            id: l.id,
            title: l.title,
            tags: l.tags,
            order_index: l.order_index,
        })
        .collect();
    CourseOut {
        id: course.id,
        name: course.name,
        description: course.description,
        difficulty: course.difficulty,
        lessons,
    }
}

async fn list_courses(State(state): State<AppState>, _auth: AuthUser) -> Json<Vec<CourseOut>> {
    let courses = state
        .store
        .courses()
        .into_iter()
        .map(|c| course_out(&state, c))
        .collect();
    Json(courses)
}

async fn course_detail(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Id>,
) -> Result<Json<CourseOut>, ApiError> {
    let course = state.store.course_by_id(id).ok_or(ApiError::NotFound)?;
    Ok(Json(course_out(&state, course)))
}

// ---- code analysis ----

#[derive(Debug, Deserialize)]
struct AnalyzeCodeReq {
    #[serde(default)]
    code: String,
}

async fn analyze_code(_auth: AuthUser, Json(body): Json<AnalyzeCodeReq>) -> Json<Value> {
    Json(json!({ "issues": codescan::scan(&body.code) }))
}
