use actix_web::{web, HttpResponse};
use shared_types::StagesResponse;
use std::sync::Arc;

use crate::database::{stages as db, Database};
use crate::error::ApiResult;
use crate::helpers::auth::AuthenticatedUser;

pub async fn list_stages(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let stages = db::list_stages(database.async_connection.clone(), &user.user_id).await?;
    Ok(HttpResponse::Ok().json(StagesResponse { stages }))
}

/// Inserts the default pipeline for a user without stages; a no-op otherwise.
pub async fn seed_stages(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    db::seed_default_stages(database.async_connection.clone(), &user.user_id).await?;
    let stages = db::list_stages(database.async_connection.clone(), &user.user_id).await?;
    Ok(HttpResponse::Ok().json(StagesResponse { stages }))
}
