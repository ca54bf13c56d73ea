pub mod log;
pub mod play;
pub mod reset;
pub mod status;

use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use aw_core::{GameAggregate, LogEntry, LogKind};
use aw_session::{JsonFileStore, SessionConfig, SnapshotStore};

/// The store for a save directory.
fn open_store(dir: &Path) -> JsonFileStore {
    JsonFileStore::new(dir)
}

/// Load the saved session, if there is one.
fn load_saved(dir: &Path) -> Result<Option<GameAggregate>, String> {
    let store = open_store(dir);
    let key = SessionConfig::default().save_key;
    store
        .load(&key)
        .map_err(|e| format!("cannot read {}: {e}", store.path_for(&key).display()))
}

/// Print the current scene with numbered choices.
fn print_scene(game: &GameAggregate) {
    let scene = game.current_scene();
    let node = game.current_node();
    println!(
        "\n  {} {}  {}",
        "━━".dimmed(),
        scene.title.bold(),
        format!("{} {}", node.kind.icon(), node.name).dimmed()
    );
    for paragraph in scene.paragraphs() {
        println!("  {paragraph}");
    }
    println!();
    for (i, choice) in scene.choices().iter().enumerate() {
        let check = match choice.required_check {
            Some(req) => format!(" [{} DC {}]", req.stat.label(), req.difficulty)
                .dimmed()
                .to_string(),
            None => String::new(),
        };
        println!("  {}. {} {}{check}", i + 1, choice.kind.icon(), choice.text);
    }
    println!();
}

/// Print log entries, one per line, styled by kind.
fn print_entries<'a>(entries: impl IntoIterator<Item = &'a LogEntry>) {
    for entry in entries {
        let line = match entry.kind {
            LogKind::Dialogue => entry.content.cyan().to_string(),
            LogKind::System => entry.content.dimmed().italic().to_string(),
            LogKind::Combat => entry.content.red().to_string(),
            LogKind::Loot => entry.content.green().to_string(),
            LogKind::Choice => entry.content.bold().to_string(),
            LogKind::Action | LogKind::Scene => entry.content.clone(),
        };
        println!("  {line}");
    }
}

/// Print the player and companions.
fn print_party(game: &GameAggregate) {
    let player = game.player();
    println!(
        "  {}  HP {}  MP {}  力量 {} 敏捷 {} 智力 {}",
        player.name.bold(),
        player.hp,
        player.mp,
        player.stats.str,
        player.stats.dex,
        player.stats.int
    );
    for companion in game.companions() {
        println!(
            "  {} ({})  HP {}  好感 {}",
            companion.name.bold(),
            companion.class,
            companion.stats.hp,
            companion.relationship.value()
        );
    }
}

/// Print the inventory as a table.
fn print_inventory(game: &GameAggregate) {
    let items = game.inventory().items();
    if items.is_empty() {
        println!("  Inventory is empty.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Item", "Kind", "Description"]);
    for (i, item) in items.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            item.to_string(),
            item.kind.to_string(),
            item.description.clone(),
        ]);
    }
    println!("{table}");
}

/// Print the map: current node, visited nodes, and exits.
fn print_map(game: &GameAggregate) {
    let current = game.current_node_id();
    for node in game.graph().nodes() {
        let marker = if node.id == *current {
            "@".green().bold().to_string()
        } else if game.visited_nodes().contains(&node.id) {
            "*".to_string()
        } else {
            " ".to_string()
        };
        let exits: Vec<&str> = game
            .graph()
            .neighbors(&node.id)
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        let exits = if exits.is_empty() {
            String::new()
        } else {
            format!(" -> {}", exits.join(", "))
        };
        println!(
            "  {marker} {} {} ({}){}",
            node.kind.icon(),
            node.name,
            node.id,
            exits.dimmed()
        );
    }
}
