use actix_web::{web, HttpResponse};
use shared_types::{
    ActivityFeedQuery, ActivityFeedResponse, ActivityForm, ActivityListQuery, SuccessResponse,
    Validate,
};
use std::sync::Arc;

use crate::database::{activities as db, Database};
use crate::error::ApiResult;
use crate::handlers::FormBody;
use crate::helpers::auth::AuthenticatedUser;

pub const DEFAULT_UPCOMING_LIMIT: u32 = 10;
const MAX_UPCOMING_LIMIT: u32 = 100;

pub async fn list_activities(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    query: web::Query<ActivityListQuery>,
) -> ApiResult<HttpResponse> {
    let activities =
        db::list_activities(database.async_connection.clone(), &user.user_id, &query).await?;
    Ok(HttpResponse::Ok().json(activities))
}

pub async fn upcoming_activities(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    query: web::Query<ActivityFeedQuery>,
) -> ApiResult<HttpResponse> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_UPCOMING_LIMIT)
        .clamp(1, MAX_UPCOMING_LIMIT);
    let activities = db::list_upcoming(
        database.async_connection.clone(),
        &user.user_id,
        chrono::Utc::now().timestamp(),
        limit,
    )
    .await?;
    Ok(HttpResponse::Ok().json(ActivityFeedResponse { activities }))
}

pub async fn overdue_activities(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let activities = db::list_overdue(
        database.async_connection.clone(),
        &user.user_id,
        chrono::Utc::now().timestamp(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(ActivityFeedResponse { activities }))
}

pub async fn get_activity(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let activity_id = path.into_inner();
    let activity =
        db::get_activity(database.async_connection.clone(), &user.user_id, &activity_id).await?;
    Ok(HttpResponse::Ok().json(activity))
}

pub async fn create_activity(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    body: FormBody<ActivityForm>,
) -> ApiResult<HttpResponse> {
    let input = body.into_inner().validate()?;
    let activity =
        db::insert_activity(database.async_connection.clone(), &user.user_id, &input).await?;

    tracing::info!(
        "Created {} activity {}",
        activity.activity.activity_type.as_str(),
        activity.activity.id
    );
    Ok(HttpResponse::Created().json(activity))
}

pub async fn update_activity(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    body: FormBody<ActivityForm>,
) -> ApiResult<HttpResponse> {
    let activity_id = path.into_inner();
    let input = body.into_inner().validate()?;
    let activity = db::update_activity(
        database.async_connection.clone(),
        &user.user_id,
        &activity_id,
        &input,
    )
    .await?;
    Ok(HttpResponse::Ok().json(activity))
}

pub async fn toggle_activity(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let activity_id = path.into_inner();
    let activity =
        db::toggle_activity(database.async_connection.clone(), &user.user_id, &activity_id)
            .await?;
    Ok(HttpResponse::Ok().json(activity))
}

pub async fn delete_activity(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let activity_id = path.into_inner();
    db::delete_activity(database.async_connection.clone(), &user.user_id, &activity_id).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}
