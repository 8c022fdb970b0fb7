//! Plain text and JSON rendering of catalog items and list states.

use databank_sdk::catalog::CatalogItem;
use databank_sdk::models::list_state::{ListState, RequestStatus};
use itertools::Itertools;

const ID_HEADER: &str = "ID";
const NAME_HEADER: &str = "NAME";
const IMAGE_HEADER: &str = "IMAGE";

/// Render items as a table of id, name and image reference.
pub fn items_table(items: &[CatalogItem]) -> String {
    let ids = items.iter().map(|item| item.id.to_string()).collect_vec();

    let id_width = ids
        .iter()
        .map(|id| id.chars().count())
        .chain([ID_HEADER.len()])
        .max()
        .unwrap_or_default();
    let name_width = items
        .iter()
        .map(|item| item.name.chars().count())
        .chain([NAME_HEADER.len()])
        .max()
        .unwrap_or_default();

    let header = format!("{ID_HEADER:<id_width$}  {NAME_HEADER:<name_width$}  {IMAGE_HEADER}");
    let rows = items.iter().zip(&ids).map(|(item, id)| {
        format!(
            "{id:<id_width$}  {name:<name_width$}  {image}",
            name = item.name,
            image = item.image_ref
        )
    });

    [header].into_iter().chain(rows).join("\n")
}

/// Render items as a pretty printed JSON array.
pub fn items_json(items: &[CatalogItem]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(items)
}

/// One line summary of what the list currently shows.
pub fn status_line(state: &ListState) -> String {
    let category = state.category();

    if state.is_searching() {
        let query = state.active_query();
        return match state.search_status() {
            RequestStatus::Loading => format!("Searching {category} for '{query}'..."),
            RequestStatus::Failed { message } => {
                format!("Search for '{query}' failed: {message} (type '/' to leave search)")
            },
            RequestStatus::Idle | RequestStatus::Succeeded => format!(
                "{} {category} matching '{query}' (type '/' to leave search)",
                state.search_results().len()
            ),
        };
    }

    let cursor = state.cursor();
    match state.feed_status() {
        RequestStatus::Loading => format!("Loading page {} of {category}...", cursor.current_page),
        RequestStatus::Failed { message } => format!(
            "Failed to load page {} of {category}: {message} (type 'more' to retry)",
            cursor.current_page
        ),
        RequestStatus::Idle | RequestStatus::Succeeded if cursor.has_more => format!(
            "{} {category} loaded, type 'more' for the next page",
            state.items().len()
        ),
        RequestStatus::Idle | RequestStatus::Succeeded => {
            format!("{} {category}, all loaded", state.items().len())
        },
    }
}

/// The displayed items followed by the status line.
pub fn list_view(state: &ListState) -> String {
    let items = state.displayed_items();
    if items.is_empty() {
        return status_line(state);
    }
    format!("{}\n\n{}", items_table(items), status_line(state))
}
