use actix_web::{web, HttpResponse};
use shared_types::{
    CompanyContactsResponse, CompanyDealsResponse, CompanyForm, CompanyListQuery,
    CompanyOptionsResponse, NoteListQuery, NotesResponse, SuccessResponse, Validate,
};
use std::sync::Arc;

use crate::database::{companies as db, contacts as contacts_db, deals as deals_db};
use crate::database::{notes as notes_db, Database};
use crate::error::ApiResult;
use crate::handlers::FormBody;
use crate::helpers::auth::AuthenticatedUser;

pub async fn list_companies(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    query: web::Query<CompanyListQuery>,
) -> ApiResult<HttpResponse> {
    let companies =
        db::list_companies(database.async_connection.clone(), &user.user_id, &query).await?;
    Ok(HttpResponse::Ok().json(companies))
}

pub async fn company_options(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let companies =
        db::list_company_options(database.async_connection.clone(), &user.user_id).await?;
    Ok(HttpResponse::Ok().json(CompanyOptionsResponse { companies }))
}

pub async fn get_company(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let company_id = path.into_inner();
    let company =
        db::get_company(database.async_connection.clone(), &user.user_id, &company_id).await?;
    Ok(HttpResponse::Ok().json(company))
}

pub async fn create_company(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    body: FormBody<CompanyForm>,
) -> ApiResult<HttpResponse> {
    let input = body.into_inner().validate()?;
    let company = db::insert_company(database.async_connection.clone(), &user.user_id, &input).await?;

    tracing::info!("Created company {}", company.id);
    Ok(HttpResponse::Created().json(company))
}

pub async fn update_company(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    body: FormBody<CompanyForm>,
) -> ApiResult<HttpResponse> {
    let company_id = path.into_inner();
    let input = body.into_inner().validate()?;
    let company = db::update_company(
        database.async_connection.clone(),
        &user.user_id,
        &company_id,
        &input,
    )
    .await?;
    Ok(HttpResponse::Ok().json(company))
}

pub async fn delete_company(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let company_id = path.into_inner();
    db::delete_company(database.async_connection.clone(), &user.user_id, &company_id).await?;

    tracing::info!("Deleted company {}", company_id);
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

pub async fn company_contacts(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let company_id = path.into_inner();
    db::get_company(database.async_connection.clone(), &user.user_id, &company_id).await?;

    let contacts = contacts_db::list_company_contacts(
        database.async_connection.clone(),
        &user.user_id,
        &company_id,
    )
    .await?;
    Ok(HttpResponse::Ok().json(CompanyContactsResponse { contacts }))
}

pub async fn company_deals(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let company_id = path.into_inner();
    db::get_company(database.async_connection.clone(), &user.user_id, &company_id).await?;

    let deals =
        deals_db::list_company_deals(database.async_connection.clone(), &user.user_id, &company_id)
            .await?;
    Ok(HttpResponse::Ok().json(CompanyDealsResponse { deals }))
}

pub async fn company_notes(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let company_id = path.into_inner();
    db::get_company(database.async_connection.clone(), &user.user_id, &company_id).await?;

    let notes = notes_db::list_notes(
        database.async_connection.clone(),
        &user.user_id,
        &NoteListQuery {
            company_id: Some(company_id),
            ..Default::default()
        },
    )
    .await?;
    Ok(HttpResponse::Ok().json(NotesResponse { notes }))
}
