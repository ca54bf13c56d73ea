use std::path::Path;

pub fn run(save_dir: &Path, format: &str) -> Result<(), String> {
    let game = super::load_saved(save_dir)?
        .ok_or_else(|| format!("no saved session in {}", save_dir.display()))?;
    let out = match format {
        "markdown" | "md" => game.log().export_markdown(),
        "text" | "txt" => game.log().export_text(),
        _ => {
            return Err(format!(
                "unknown format '{format}' (expected: markdown, text)"
            ));
        }
    };
    print!("{out}");
    Ok(())
}
