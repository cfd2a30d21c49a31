pub mod build;
pub mod fix_family_id;
pub mod lint_ru;
pub mod schema;
pub mod verify;

/// Print a report as a single JSON document on stdout.
pub(crate) fn write_json<T: serde::Serialize>(value: &T) -> color_eyre::Result<()> {
    use std::io::Write;
    let mut out = std::io::stdout().lock();
    serde_json::to_writer(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Colored status word, or the plain word when color is off.
pub(crate) fn paint(word: &str, style: Style, use_color: bool) -> String {
    if !use_color {
        return word.to_string();
    }
    use owo_colors::OwoColorize;
    match style {
        Style::Good => word.green().to_string(),
        Style::Warn => word.yellow().to_string(),
        Style::Bad => word.red().to_string(),
        Style::Path => word.blue().to_string(),
    }
}

#[derive(Clone, Copy)]
pub(crate) enum Style {
    Good,
    Warn,
    Bad,
    Path,
}
