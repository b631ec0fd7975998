use actix_web::{web, HttpResponse};
use shared_types::{
    ActivityListQuery, ContactForm, ContactListQuery, ContactOptionsResponse, NoteListQuery,
    NotesResponse, SuccessResponse, Validate,
};
use std::sync::Arc;

use crate::database::{activities as activities_db, contacts as db, notes as notes_db, Database};
use crate::error::ApiResult;
use crate::handlers::FormBody;
use crate::helpers::auth::AuthenticatedUser;

pub async fn list_contacts(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    query: web::Query<ContactListQuery>,
) -> ApiResult<HttpResponse> {
    let contacts =
        db::list_contacts(database.async_connection.clone(), &user.user_id, &query).await?;
    Ok(HttpResponse::Ok().json(contacts))
}

pub async fn contact_options(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let contacts = db::list_contact_options(database.async_connection.clone(), &user.user_id).await?;
    Ok(HttpResponse::Ok().json(ContactOptionsResponse { contacts }))
}

pub async fn get_contact(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let contact_id = path.into_inner();
    let contact =
        db::get_contact(database.async_connection.clone(), &user.user_id, &contact_id).await?;
    Ok(HttpResponse::Ok().json(contact))
}

pub async fn create_contact(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    body: FormBody<ContactForm>,
) -> ApiResult<HttpResponse> {
    let input = body.into_inner().validate()?;
    let contact = db::insert_contact(database.async_connection.clone(), &user.user_id, &input).await?;

    tracing::info!("Created contact {}", contact.contact.id);
    Ok(HttpResponse::Created().json(contact))
}

pub async fn update_contact(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    body: FormBody<ContactForm>,
) -> ApiResult<HttpResponse> {
    let contact_id = path.into_inner();
    let input = body.into_inner().validate()?;
    let contact = db::update_contact(
        database.async_connection.clone(),
        &user.user_id,
        &contact_id,
        &input,
    )
    .await?;
    Ok(HttpResponse::Ok().json(contact))
}

pub async fn delete_contact(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let contact_id = path.into_inner();
    db::delete_contact(database.async_connection.clone(), &user.user_id, &contact_id).await?;

    tracing::info!("Deleted contact {}", contact_id);
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

pub async fn contact_notes(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let contact_id = path.into_inner();
    db::get_contact(database.async_connection.clone(), &user.user_id, &contact_id).await?;

    let notes = notes_db::list_notes(
        database.async_connection.clone(),
        &user.user_id,
        &NoteListQuery {
            contact_id: Some(contact_id),
            ..Default::default()
        },
    )
    .await?;
    Ok(HttpResponse::Ok().json(NotesResponse { notes }))
}

pub async fn contact_activities(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    query: web::Query<ActivityListQuery>,
) -> ApiResult<HttpResponse> {
    let contact_id = path.into_inner();
    db::get_contact(database.async_connection.clone(), &user.user_id, &contact_id).await?;

    let query = ActivityListQuery {
        contact_id: Some(contact_id),
        ..query.into_inner()
    };
    let activities =
        activities_db::list_activities(database.async_connection.clone(), &user.user_id, &query)
            .await?;
    Ok(HttpResponse::Ok().json(activities))
}
