pub mod activities;
pub mod companies;
pub mod contacts;
pub mod dashboard;
pub mod deals;
pub mod notes;
pub mod pages;
pub mod profile;
pub mod stages;

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpMessage, HttpRequest, HttpResponse, Responder};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::database::Database;
use crate::error::{form_error_handler, json_error_handler};

/// Create and update bodies: a submitted HTML form when the request says so, JSON otherwise.
pub struct FormBody<T>(pub T);

impl<T> FormBody<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: DeserializeOwned + 'static> FromRequest for FormBody<T> {
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        if req.content_type() == "application/x-www-form-urlencoded" {
            let form = web::Form::<T>::from_request(req, payload);
            Box::pin(async move { Ok(FormBody(form.await?.into_inner())) })
        } else {
            let json = web::Json::<T>::from_request(req, payload);
            Box::pin(async move { Ok(FormBody(json.await?.into_inner())) })
        }
    }
}

async fn index() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "CRM API"
    }))
}

async fn health(db: web::Data<Arc<Database>>) -> impl Responder {
    match db.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "database": "connected"
        })),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "status": "unhealthy",
                "database": "disconnected"
            }))
        }
    }
}

/// Registers every route. Fixed segments come before `{id}` captures.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::FormConfig::default().error_handler(form_error_handler))
        .route("/", web::get().to(index))
        .route("/health", web::get().to(health))
        // auth pages
        .route("/login", web::get().to(pages::login_page))
        .route("/signup", web::get().to(pages::signup_page))
        .route("/forgot-password", web::get().to(pages::forgot_password_page))
        // pages
        .route("/dashboard", web::get().to(pages::dashboard_page))
        .route("/contacts", web::get().to(pages::contacts_page))
        .route("/contacts/new", web::get().to(pages::new_contact_page))
        .route("/contacts/{id}", web::get().to(pages::contact_detail_page))
        .route("/contacts/{id}/edit", web::get().to(pages::edit_contact_page))
        .route("/companies", web::get().to(pages::companies_page))
        .route("/companies/new", web::get().to(pages::new_company_page))
        .route("/companies/{id}", web::get().to(pages::company_detail_page))
        .route("/companies/{id}/edit", web::get().to(pages::edit_company_page))
        .route("/deals", web::get().to(pages::deals_board_page))
        .route("/deals/list", web::get().to(pages::deals_list_page))
        .route("/deals/new", web::get().to(pages::new_deal_page))
        .route("/deals/{id}", web::get().to(pages::deal_detail_page))
        .route("/deals/{id}/edit", web::get().to(pages::edit_deal_page))
        .route("/activities", web::get().to(pages::activities_page))
        .route("/settings/profile", web::get().to(pages::profile_page))
        // contacts
        .route("/api/contacts", web::get().to(contacts::list_contacts))
        .route("/api/contacts", web::post().to(contacts::create_contact))
        .route("/api/contacts/options", web::get().to(contacts::contact_options))
        .route("/api/contacts/{id}", web::get().to(contacts::get_contact))
        .route("/api/contacts/{id}", web::put().to(contacts::update_contact))
        .route("/api/contacts/{id}", web::delete().to(contacts::delete_contact))
        .route("/api/contacts/{id}/notes", web::get().to(contacts::contact_notes))
        .route("/api/contacts/{id}/activities", web::get().to(contacts::contact_activities))
        // companies
        .route("/api/companies", web::get().to(companies::list_companies))
        .route("/api/companies", web::post().to(companies::create_company))
        .route("/api/companies/options", web::get().to(companies::company_options))
        .route("/api/companies/{id}", web::get().to(companies::get_company))
        .route("/api/companies/{id}", web::put().to(companies::update_company))
        .route("/api/companies/{id}", web::delete().to(companies::delete_company))
        .route("/api/companies/{id}/contacts", web::get().to(companies::company_contacts))
        .route("/api/companies/{id}/deals", web::get().to(companies::company_deals))
        .route("/api/companies/{id}/notes", web::get().to(companies::company_notes))
        // deals
        .route("/api/deals", web::get().to(deals::list_deals))
        .route("/api/deals", web::post().to(deals::create_deal))
        .route("/api/deals/board", web::get().to(deals::get_board))
        .route("/api/deals/move", web::post().to(deals::move_deal))
        .route("/api/deals/reorder", web::post().to(deals::reorder_deals))
        .route("/api/deals/{id}", web::get().to(deals::get_deal))
        .route("/api/deals/{id}", web::put().to(deals::update_deal))
        .route("/api/deals/{id}", web::delete().to(deals::delete_deal))
        .route("/api/deals/{id}/contacts", web::get().to(deals::list_deal_contacts))
        .route("/api/deals/{id}/contacts", web::post().to(deals::add_deal_contact))
        .route(
            "/api/deals/{id}/contacts/{contact_id}",
            web::delete().to(deals::remove_deal_contact),
        )
        .route("/api/deals/{id}/notes", web::get().to(deals::deal_notes))
        .route("/api/deals/{id}/activities", web::get().to(deals::deal_activities))
        // stages
        .route("/api/stages", web::get().to(stages::list_stages))
        .route("/api/stages/seed", web::post().to(stages::seed_stages))
        // activities
        .route("/api/activities", web::get().to(activities::list_activities))
        .route("/api/activities", web::post().to(activities::create_activity))
        .route("/api/activities/upcoming", web::get().to(activities::upcoming_activities))
        .route("/api/activities/overdue", web::get().to(activities::overdue_activities))
        .route("/api/activities/{id}", web::get().to(activities::get_activity))
        .route("/api/activities/{id}", web::put().to(activities::update_activity))
        .route("/api/activities/{id}", web::delete().to(activities::delete_activity))
        .route("/api/activities/{id}/toggle", web::post().to(activities::toggle_activity))
        // notes
        .route("/api/notes", web::get().to(notes::list_notes))
        .route("/api/notes", web::post().to(notes::create_note))
        .route("/api/notes/{id}", web::put().to(notes::update_note))
        .route("/api/notes/{id}", web::delete().to(notes::delete_note))
        // profile
        .route("/api/profile", web::get().to(profile::get_profile))
        .route("/api/profile", web::put().to(profile::update_profile))
        // dashboard
        .route("/api/dashboard", web::get().to(dashboard::get_stats))
        .route("/api/dashboard/pipeline", web::get().to(dashboard::get_pipeline_summary));
}
