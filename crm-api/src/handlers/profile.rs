use actix_web::{web, HttpResponse};
use shared_types::{ProfileForm, Validate};
use std::sync::Arc;

use crate::database::{profiles as db, Database};
use crate::error::ApiResult;
use crate::handlers::FormBody;
use crate::helpers::auth::AuthenticatedUser;

pub async fn get_profile(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let profile = db::get_or_create_profile(
        database.async_connection.clone(),
        &user.user_id,
        user.email.as_deref(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn update_profile(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    body: FormBody<ProfileForm>,
) -> ApiResult<HttpResponse> {
    let input = body.into_inner().validate()?;
    let profile = db::update_profile(
        database.async_connection.clone(),
        &user.user_id,
        user.email.as_deref(),
        &input,
    )
    .await?;

    tracing::info!("Updated profile for user {}", user.user_id);
    Ok(HttpResponse::Ok().json(profile))
}
