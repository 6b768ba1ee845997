use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use buildlinks::{falsy_to_empty, short_master_name, Registry};

/// Table and cell creation helpers
fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).fg(TableColor::Cyan)
}

fn optional_cell(value: Option<&str>) -> Cell {
    match value {
        Some(text) if !text.is_empty() => Cell::new(text),
        _ => Cell::new("-").fg(TableColor::DarkGrey),
    }
}

pub fn repositories_table(registry: &Registry) -> Table {
    let mut table = create_table();
    table.set_header(vec![
        header_cell("Repository"),
        header_cell("Short"),
        header_cell("Revision property"),
        header_cell("Change URL"),
    ]);

    for repo in registry.repositories() {
        table.add_row(vec![
            Cell::new(&repo.name),
            Cell::new(falsy_to_empty(repo.short_name.as_deref())),
            optional_cell(repo.revision_property.as_deref()),
            Cell::new(&repo.change_url),
        ]);
    }

    table
}

pub fn masters_table(registry: &Registry) -> Table {
    let mut table = create_table();
    table.set_header(vec![
        header_cell("Master"),
        header_cell("Label"),
        header_cell("Path segment"),
        header_cell("Groups"),
    ]);

    for master in registry.masters() {
        table.add_row(vec![
            Cell::new(&master.display_name),
            Cell::new(short_master_name(&master.url_path_segment)),
            Cell::new(&master.url_path_segment),
            optional_cell(Some(master.groups.join(", ").as_str())),
        ]);
    }

    table
}
