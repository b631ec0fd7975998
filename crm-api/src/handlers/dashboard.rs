use actix_web::{web, HttpResponse};
use shared_types::PipelineSummaryResponse;
use std::sync::Arc;

use crate::database::{dashboard as db, Database};
use crate::error::ApiResult;
use crate::helpers::auth::AuthenticatedUser;

pub async fn get_stats(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let stats = db::get_dashboard_stats(
        database.async_connection.clone(),
        &user.user_id,
        chrono::Utc::now().timestamp(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(stats))
}

pub async fn get_pipeline_summary(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let stages = db::get_pipeline_summary(database.async_connection.clone(), &user.user_id).await?;
    Ok(HttpResponse::Ok().json(PipelineSummaryResponse { stages }))
}
