use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthUser,
    error::Result,
    models::shift::{
        CreateShiftRequest, Shift, ShiftListParams, ShiftPage, UpdateShiftRequest,
        UpdateShiftStatusRequest,
    },
    shift_repo,
};

pub async fn list(
    State(pool): State<PgPool>,
    auth: AuthUser,
    Query(params): Query<ShiftListParams>,
) -> Result<Json<ShiftPage>> {
    Ok(Json(shift_repo::list(&pool, &auth, &params).await?))
}

pub async fn get_one(
    State(pool): State<PgPool>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Shift>> {
    Ok(Json(shift_repo::get(&pool, &auth, id).await?))
}

pub async fn create(
    State(pool): State<PgPool>,
    auth: AuthUser,
    Json(req): Json<CreateShiftRequest>,
) -> Result<(StatusCode, Json<Shift>)> {
    req.validate()?;
    let shift = shift_repo::create(&pool, &auth, &req).await?;
    Ok((StatusCode::CREATED, Json(shift)))
}

pub async fn update(
    State(pool): State<PgPool>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateShiftRequest>,
) -> Result<Json<Shift>> {
    req.validate()?;
    Ok(Json(shift_repo::update(&pool, &auth, id, &req).await?))
}

pub async fn update_status(
    State(pool): State<PgPool>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateShiftStatusRequest>,
) -> Result<Json<Shift>> {
    let shift = shift_repo::set_status(&pool, &auth, id, &req, OffsetDateTime::now_utc()).await?;
    Ok(Json(shift))
}

pub async fn delete(
    State(pool): State<PgPool>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>> {
    shift_repo::delete(&pool, &auth, id).await?;
    Ok(Json(json!({ "ok": true })))
}
