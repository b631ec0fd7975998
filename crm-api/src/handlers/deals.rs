use actix_web::{web, HttpResponse};
use shared_types::{
    ActivityListQuery, DealContactForm, DealContactsResponse, DealForm, DealListQuery,
    MoveDealRequest, NoteListQuery, NotesResponse, ReorderDealsRequest, SuccessResponse,
    Validate,
};
use std::sync::Arc;

use crate::database::{activities as activities_db, deals as db, notes as notes_db, Database};
use crate::error::ApiResult;
use crate::handlers::FormBody;
use crate::helpers::auth::AuthenticatedUser;

pub async fn list_deals(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    query: web::Query<DealListQuery>,
) -> ApiResult<HttpResponse> {
    let deals = db::list_deals(database.async_connection.clone(), &user.user_id, &query).await?;
    Ok(HttpResponse::Ok().json(deals))
}

pub async fn get_board(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let board = db::get_board(database.async_connection.clone(), &user.user_id).await?;
    Ok(HttpResponse::Ok().json(board))
}

pub async fn get_deal(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let deal_id = path.into_inner();
    let deal = db::get_deal(database.async_connection.clone(), &user.user_id, &deal_id).await?;
    Ok(HttpResponse::Ok().json(deal))
}

pub async fn create_deal(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    body: FormBody<DealForm>,
) -> ApiResult<HttpResponse> {
    let input = body.into_inner().validate()?;
    let deal = db::insert_deal(database.async_connection.clone(), &user.user_id, &input).await?;

    tracing::info!("Created deal {} in stage {}", deal.deal.id, deal.stage.name);
    Ok(HttpResponse::Created().json(deal))
}

pub async fn update_deal(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    body: FormBody<DealForm>,
) -> ApiResult<HttpResponse> {
    let deal_id = path.into_inner();
    let input = body.into_inner().validate()?;
    let deal =
        db::update_deal(database.async_connection.clone(), &user.user_id, &deal_id, &input)
            .await?;
    Ok(HttpResponse::Ok().json(deal))
}

pub async fn delete_deal(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let deal_id = path.into_inner();
    db::delete_deal(database.async_connection.clone(), &user.user_id, &deal_id).await?;

    tracing::info!("Deleted deal {}", deal_id);
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

/// Persists a drag and drop on the board.
pub async fn move_deal(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    request: web::Json<MoveDealRequest>,
) -> ApiResult<HttpResponse> {
    let request = request.validate()?;
    let deal = db::move_deal(database.async_connection.clone(), &user.user_id, &request).await?;
    Ok(HttpResponse::Ok().json(deal))
}

pub async fn reorder_deals(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    request: web::Json<ReorderDealsRequest>,
) -> ApiResult<HttpResponse> {
    let updates = request.validate()?;
    db::reorder_deals(database.async_connection.clone(), &user.user_id, &updates).await?;

    tracing::debug!("Reordered {} deals", updates.len());
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

pub async fn list_deal_contacts(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let deal_id = path.into_inner();
    let contacts =
        db::list_deal_contacts(database.async_connection.clone(), &user.user_id, &deal_id)
            .await?;
    Ok(HttpResponse::Ok().json(DealContactsResponse { contacts }))
}

pub async fn add_deal_contact(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    body: FormBody<DealContactForm>,
) -> ApiResult<HttpResponse> {
    let deal_id = path.into_inner();
    let input = body.into_inner().validate()?;
    db::add_deal_contact(database.async_connection.clone(), &user.user_id, &deal_id, &input)
        .await?;

    let contacts =
        db::list_deal_contacts(database.async_connection.clone(), &user.user_id, &deal_id)
            .await?;
    Ok(HttpResponse::Ok().json(DealContactsResponse { contacts }))
}

pub async fn remove_deal_contact(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (deal_id, contact_id) = path.into_inner();
    db::remove_deal_contact(
        database.async_connection.clone(),
        &user.user_id,
        &deal_id,
        &contact_id,
    )
    .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

pub async fn deal_notes(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let deal_id = path.into_inner();
    db::get_deal(database.async_connection.clone(), &user.user_id, &deal_id).await?;

    let notes = notes_db::list_notes(
        database.async_connection.clone(),
        &user.user_id,
        &NoteListQuery {
            deal_id: Some(deal_id),
            ..Default::default()
        },
    )
    .await?;
    Ok(HttpResponse::Ok().json(NotesResponse { notes }))
}

pub async fn deal_activities(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    query: web::Query<ActivityListQuery>,
) -> ApiResult<HttpResponse> {
    let deal_id = path.into_inner();
    db::get_deal(database.async_connection.clone(), &user.user_id, &deal_id).await?;

    let query = ActivityListQuery {
        deal_id: Some(deal_id),
        ..query.into_inner()
    };
    let activities =
        activities_db::list_activities(database.async_connection.clone(), &user.user_id, &query)
            .await?;
    Ok(HttpResponse::Ok().json(activities))
}
