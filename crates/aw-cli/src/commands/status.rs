use std::path::Path;

use colored::Colorize;

pub fn run(save_dir: &Path) -> Result<(), String> {
    let Some(game) = super::load_saved(save_dir)? else {
        println!("  No saved session in {}.", save_dir.display());
        return Ok(());
    };

    let node = game.current_node();
    println!("  {}", game.current_scene().title.bold());
    println!("  Location: {} {}", node.kind.icon(), node.name);
    println!("  Turn:     {}", game.phase());
    println!("  Screen:   {}", game.active_screen());
    println!(
        "  Explored: {}/{} rooms",
        game.visited_nodes().len(),
        game.graph().nodes().len()
    );
    println!(
        "  Items:    {} | Log entries: {}",
        game.inventory().len(),
        game.log().len()
    );
    println!();
    super::print_party(&game);

    Ok(())
}
