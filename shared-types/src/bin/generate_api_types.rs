use shared_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut types = Vec::new();

    // Shared
    types.push(clean_type(ErrorResponse::export_to_string()?));
    types.push(clean_type(SuccessResponse::export_to_string()?));
    types.push(clean_type(ValidationErrors::export_to_string()?));

    // Contact types
    types.push(clean_type(ContactStatus::export_to_string()?));
    types.push(clean_type(Contact::export_to_string()?));
    types.push(clean_type(ContactRef::export_to_string()?));
    types.push(clean_type(ContactWithCompany::export_to_string()?));
    types.push(clean_type(ContactForm::export_to_string()?));
    types.push(clean_type(ContactListQuery::export_to_string()?));
    types.push(clean_type(ContactsResponse::export_to_string()?));
    types.push(clean_type(ContactOptionsResponse::export_to_string()?));

    // Company types
    types.push(clean_type(Company::export_to_string()?));
    types.push(clean_type(CompanyRef::export_to_string()?));
    types.push(clean_type(CompanyForm::export_to_string()?));
    types.push(clean_type(CompanyListQuery::export_to_string()?));
    types.push(clean_type(CompaniesResponse::export_to_string()?));
    types.push(clean_type(CompanyOptionsResponse::export_to_string()?));
    types.push(clean_type(CompanyContactsResponse::export_to_string()?));
    types.push(clean_type(CompanyDealsResponse::export_to_string()?));

    // Deal types
    types.push(clean_type(DealStage::export_to_string()?));
    types.push(clean_type(Deal::export_to_string()?));
    types.push(clean_type(DealRef::export_to_string()?));
    types.push(clean_type(DealWithDetails::export_to_string()?));
    types.push(clean_type(DealContact::export_to_string()?));
    types.push(clean_type(DealForm::export_to_string()?));
    types.push(clean_type(DealContactForm::export_to_string()?));
    types.push(clean_type(MoveDealRequest::export_to_string()?));
    types.push(clean_type(DealPositionUpdate::export_to_string()?));
    types.push(clean_type(ReorderDealsRequest::export_to_string()?));
    types.push(clean_type(DealListQuery::export_to_string()?));
    types.push(clean_type(DealsResponse::export_to_string()?));
    types.push(clean_type(StagesResponse::export_to_string()?));
    types.push(clean_type(DealContactsResponse::export_to_string()?));

    // Pipeline board
    types.push(clean_type(BoardColumn::export_to_string()?));
    types.push(clean_type(PipelineBoard::export_to_string()?));
    types.push(clean_type(DragLocation::export_to_string()?));
    types.push(clean_type(DragResult::export_to_string()?));

    // Activity types
    types.push(clean_type(ActivityType::export_to_string()?));
    types.push(clean_type(Activity::export_to_string()?));
    types.push(clean_type(ActivityWithRefs::export_to_string()?));
    types.push(clean_type(ActivityForm::export_to_string()?));
    types.push(clean_type(ActivityListQuery::export_to_string()?));
    types.push(clean_type(ActivityFeedQuery::export_to_string()?));
    types.push(clean_type(ActivitiesResponse::export_to_string()?));
    types.push(clean_type(ActivityFeedResponse::export_to_string()?));

    // Notes
    types.push(clean_type(Note::export_to_string()?));
    types.push(clean_type(NoteForm::export_to_string()?));
    types.push(clean_type(NoteListQuery::export_to_string()?));
    types.push(clean_type(NotesResponse::export_to_string()?));

    // Profile and dashboard
    types.push(clean_type(Profile::export_to_string()?));
    types.push(clean_type(ProfileForm::export_to_string()?));
    types.push(clean_type(DashboardStats::export_to_string()?));
    types.push(clean_type(StageSummary::export_to_string()?));
    types.push(clean_type(PipelineSummaryResponse::export_to_string()?));

    // Page data; `Page<T>` wraps each of these with the viewer
    types.push(clean_type(Viewer::export_to_string()?));
    types.push(clean_type(AuthPage::export_to_string()?));
    types.push(clean_type(DashboardPage::export_to_string()?));
    types.push(clean_type(ContactsPage::export_to_string()?));
    types.push(clean_type(ContactFormPage::export_to_string()?));
    types.push(clean_type(ContactDetailPage::export_to_string()?));
    types.push(clean_type(CompaniesPage::export_to_string()?));
    types.push(clean_type(CompanyFormPage::export_to_string()?));
    types.push(clean_type(CompanyDetailPage::export_to_string()?));
    types.push(clean_type(DealBoardPage::export_to_string()?));
    types.push(clean_type(DealListPage::export_to_string()?));
    types.push(clean_type(DealFormPage::export_to_string()?));
    types.push(clean_type(DealDetailPage::export_to_string()?));
    types.push(clean_type(ActivitiesPage::export_to_string()?));
    types.push(clean_type(ProfilePage::export_to_string()?));

    let output_dir = Path::new("../web/src/api-types");
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

/// Strips the per-file banner and the cross-file imports ts-rs emits, since every type
/// lands in the same module.
fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    let filtered: Vec<&str> = type_def
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect();

    let result = filtered.join("\n").trim().to_string();
    if result.is_empty() {
        result
    } else {
        format!("{}\n", result)
    }
}
