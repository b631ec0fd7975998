//! Page data for the web front-end. Every protected page answers with [`Page`]: the
//! signed-in viewer plus whatever the page renders.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use shared_types::{
    ActivitiesPage, ActivityListQuery, AuthPage, CompaniesPage, CompanyDetailPage,
    CompanyFormPage, CompanyListQuery, ContactDetailPage, ContactFormPage, ContactListQuery,
    ContactsPage, DashboardPage, DealBoardPage, DealDetailPage, DealFormPage, DealListPage,
    DealListQuery, NoteListQuery, Page, ProfilePage, Viewer,
};
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::database::{
    activities, companies, contacts, dashboard, deals, notes, profiles, stages, Database,
};
use crate::error::ApiResult;
use crate::helpers::auth::AuthenticatedUser;

/// Upcoming activities shown on the dashboard.
const DASHBOARD_UPCOMING: u32 = 5;

/// Search parameters the list pages understand.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub q: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub page: Option<u32>,
}

async fn viewer(database: &Database, user: &AuthenticatedUser) -> ApiResult<Viewer> {
    let profile = profiles::get_or_create_profile(
        database.async_connection.clone(),
        &user.user_id,
        user.email.as_deref(),
    )
    .await?;
    Ok(Viewer::new(
        &user.user_id,
        user.email.as_deref(),
        Some(&profile),
    ))
}

async fn render<T: Serialize>(
    database: &Database,
    user: &AuthenticatedUser,
    data: T,
) -> ApiResult<HttpResponse> {
    let viewer = viewer(database, user).await?;
    Ok(HttpResponse::Ok().json(Page { viewer, data }))
}

pub async fn dashboard_page(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let conn = database.async_connection.clone();
    let now = chrono::Utc::now().timestamp();

    let data = DashboardPage {
        stats: dashboard::get_dashboard_stats(conn.clone(), &user.user_id, now).await?,
        pipeline: dashboard::get_pipeline_summary(conn.clone(), &user.user_id).await?,
        upcoming: activities::list_upcoming(conn, &user.user_id, now, DASHBOARD_UPCOMING)
            .await?,
    };
    render(&database, &user, data).await
}

pub async fn contacts_page(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let query = query.into_inner();
    let contacts = contacts::list_contacts(
        database.async_connection.clone(),
        &user.user_id,
        &ContactListQuery {
            page: query.page,
            search: query.q,
            status: query.status,
        },
    )
    .await?;
    render(&database, &user, ContactsPage { contacts }).await
}

pub async fn new_contact_page(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let companies =
        companies::list_company_options(database.async_connection.clone(), &user.user_id).await?;
    render(
        &database,
        &user,
        ContactFormPage {
            contact: None,
            companies,
        },
    )
    .await
}

pub async fn edit_contact_page(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let contact_id = path.into_inner();
    let conn = database.async_connection.clone();
    let contact = contacts::get_contact(conn.clone(), &user.user_id, &contact_id).await?;
    let companies = companies::list_company_options(conn, &user.user_id).await?;
    render(
        &database,
        &user,
        ContactFormPage {
            contact: Some(contact),
            companies,
        },
    )
    .await
}

pub async fn contact_detail_page(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let contact_id = path.into_inner();
    let conn = database.async_connection.clone();
    let contact = contacts::get_contact(conn.clone(), &user.user_id, &contact_id).await?;

    let activities = activities::list_activities(
        conn.clone(),
        &user.user_id,
        &ActivityListQuery {
            contact_id: Some(contact_id.clone()),
            ..Default::default()
        },
    )
    .await?
    .activities;
    let notes = notes::list_notes(
        conn.clone(),
        &user.user_id,
        &NoteListQuery {
            contact_id: Some(contact_id.clone()),
            ..Default::default()
        },
    )
    .await?;
    let deals = deals::list_contact_deals(conn, &user.user_id, &contact_id).await?;

    render(
        &database,
        &user,
        ContactDetailPage {
            contact,
            activities,
            notes,
            deals,
        },
    )
    .await
}

pub async fn companies_page(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let query = query.into_inner();
    let companies = companies::list_companies(
        database.async_connection.clone(),
        &user.user_id,
        &CompanyListQuery {
            page: query.page,
            search: query.q,
        },
    )
    .await?;
    render(&database, &user, CompaniesPage { companies }).await
}

pub async fn new_company_page(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    render(&database, &user, CompanyFormPage { company: None }).await
}

pub async fn edit_company_page(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let company_id = path.into_inner();
    let company =
        companies::get_company(database.async_connection.clone(), &user.user_id, &company_id)
            .await?;
    render(
        &database,
        &user,
        CompanyFormPage {
            company: Some(company),
        },
    )
    .await
}

pub async fn company_detail_page(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let company_id = path.into_inner();
    let conn = database.async_connection.clone();
    let company = companies::get_company(conn.clone(), &user.user_id, &company_id).await?;

    let contacts = contacts::list_company_contacts(conn.clone(), &user.user_id, &company_id).await?;
    let deals = deals::list_company_deals(conn.clone(), &user.user_id, &company_id).await?;
    let notes = notes::list_notes(
        conn,
        &user.user_id,
        &NoteListQuery {
            company_id: Some(company_id),
            ..Default::default()
        },
    )
    .await?;

    render(
        &database,
        &user,
        CompanyDetailPage {
            company,
            contacts,
            deals,
            notes,
        },
    )
    .await
}

pub async fn deals_board_page(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let board = deals::get_board(database.async_connection.clone(), &user.user_id).await?;
    let total_deals = board.columns.iter().map(|c| c.deals.len()).sum();
    render(&database, &user, DealBoardPage { board, total_deals }).await
}

pub async fn deals_list_page(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let query = query.into_inner();
    let conn = database.async_connection.clone();
    let deals = deals::list_deals(
        conn.clone(),
        &user.user_id,
        &DealListQuery {
            page: query.page,
            search: query.q,
            stage_id: None,
        },
    )
    .await?;
    let stages = stages::list_stages(conn, &user.user_id).await?;
    render(&database, &user, DealListPage { deals, stages }).await
}

pub async fn new_deal_page(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let conn = database.async_connection.clone();
    let stages = stages::list_stages(conn.clone(), &user.user_id).await?;
    let companies = companies::list_company_options(conn, &user.user_id).await?;
    render(
        &database,
        &user,
        DealFormPage {
            deal: None,
            stages,
            companies,
        },
    )
    .await
}

pub async fn edit_deal_page(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let deal_id = path.into_inner();
    let conn = database.async_connection.clone();
    let deal = deals::get_deal(conn.clone(), &user.user_id, &deal_id).await?;
    let stages = stages::list_stages(conn.clone(), &user.user_id).await?;
    let companies = companies::list_company_options(conn, &user.user_id).await?;
    render(
        &database,
        &user,
        DealFormPage {
            deal: Some(deal),
            stages,
            companies,
        },
    )
    .await
}

pub async fn deal_detail_page(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let deal_id = path.into_inner();
    let conn = database.async_connection.clone();
    let deal = deals::get_deal(conn.clone(), &user.user_id, &deal_id).await?;

    let contacts = deals::list_deal_contacts(conn.clone(), &user.user_id, &deal_id).await?;
    let activities = activities::list_activities(
        conn.clone(),
        &user.user_id,
        &ActivityListQuery {
            deal_id: Some(deal_id.clone()),
            ..Default::default()
        },
    )
    .await?
    .activities;
    let notes = notes::list_notes(
        conn,
        &user.user_id,
        &NoteListQuery {
            deal_id: Some(deal_id),
            ..Default::default()
        },
    )
    .await?;

    render(
        &database,
        &user,
        DealDetailPage {
            deal,
            contacts,
            activities,
            notes,
        },
    )
    .await
}

pub async fn activities_page(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let query = query.into_inner();
    let current_type = query.activity_type.clone().unwrap_or_default();
    let conn = database.async_connection.clone();

    let activities = activities::list_activities(
        conn.clone(),
        &user.user_id,
        &ActivityListQuery {
            page: query.page,
            activity_type: query.activity_type.filter(|t| !t.is_empty()),
            ..Default::default()
        },
    )
    .await?;
    let contacts = contacts::list_contact_options(conn, &user.user_id).await?;

    render(
        &database,
        &user,
        ActivitiesPage {
            activities,
            contacts,
            current_type,
        },
    )
    .await
}

pub async fn profile_page(
    database: web::Data<Arc<Database>>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let profile = profiles::get_or_create_profile(
        database.async_connection.clone(),
        &user.user_id,
        user.email.as_deref(),
    )
    .await?;
    let viewer = Viewer::new(&user.user_id, user.email.as_deref(), Some(&profile));
    Ok(HttpResponse::Ok().json(Page {
        viewer,
        data: ProfilePage { profile },
    }))
}

fn auth_page(auth: &AuthConfig, page: &str, title: &str) -> HttpResponse {
    HttpResponse::Ok().json(AuthPage {
        page: page.to_string(),
        title: title.to_string(),
        provider_url: auth.provider_url.clone(),
        redirect_to: "/dashboard".to_string(),
    })
}

pub async fn login_page(auth: web::Data<AuthConfig>) -> HttpResponse {
    auth_page(&auth, "login", "Sign in")
}

pub async fn signup_page(auth: web::Data<AuthConfig>) -> HttpResponse {
    auth_page(&auth, "signup", "Create an account")
}

pub async fn forgot_password_page(auth: web::Data<AuthConfig>) -> HttpResponse {
    auth_page(&auth, "forgot-password", "Reset your password")
}
