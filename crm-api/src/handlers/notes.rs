use actix_web::{web, HttpResponse};
use shared_types::{NoteForm, NoteListQuery, NotesResponse, SuccessResponse, Validate};
use std::sync::Arc;

use crate::database::{notes as db, Database};
use crate::error::ApiResult;
use crate::handlers::FormBody;
use crate::helpers::auth::AuthenticatedUser;

pub async fn list_notes(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    query: web::Query<NoteListQuery>,
) -> ApiResult<HttpResponse> {
    let notes = db::list_notes(database.async_connection.clone(), &user.user_id, &query).await?;
    Ok(HttpResponse::Ok().json(NotesResponse { notes }))
}

pub async fn create_note(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    body: FormBody<NoteForm>,
) -> ApiResult<HttpResponse> {
    let input = body.into_inner().validate()?;
    let note = db::insert_note(database.async_connection.clone(), &user.user_id, &input).await?;
    Ok(HttpResponse::Created().json(note))
}

/// Only the content is editable; the record a note hangs off is fixed.
pub async fn update_note(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    body: FormBody<NoteForm>,
) -> ApiResult<HttpResponse> {
    let note_id = path.into_inner();
    let input = body.into_inner().validate()?;
    let note = db::update_note(
        database.async_connection.clone(),
        &user.user_id,
        &note_id,
        &input.content,
    )
    .await?;
    Ok(HttpResponse::Ok().json(note))
}

pub async fn delete_note(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let note_id = path.into_inner();
    db::delete_note(database.async_connection.clone(), &user.user_id, &note_id).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}
