use crate::model::{AggregateResult, ListEntry, NO_VOTE, UserStats};

/// Section names understood by the text formatter, in default order.
const SECTIONS: [&str; 4] = ["player", "finished", "playing", "favourites"];

/// Configuration for plain text output
#[derive(Debug, Clone)]
pub struct TextConfig {
    /// Print each entry's tags under it
    pub include_tags: bool,

    /// Print the user's notes under each entry
    pub include_notes: bool,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self { include_tags: true, include_notes: false }
    }
}

/// Plain text formatter for terminal output
pub struct TextFormatter {
    config: TextConfig,
}

impl TextFormatter {
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, result: &AggregateResult) -> String {
        convert_to_text(result, &self.config)
    }
}

/// Render an aggregate as plain text.
///
/// When `sections` is an array of names, only those sections are printed,
/// in that order; otherwise every section is printed.
pub fn convert_to_text(result: &AggregateResult, config: &TextConfig) -> String {
    let blocks: Vec<String> = selected_sections(&result.sections)
        .into_iter()
        .filter_map(|section| match section {
            "player" => Some(player_block(&result.player)),
            "finished" => Some(list_block("Recently finished", &result.finished_vns, config)),
            "playing" => Some(list_block("Currently playing", &result.playing_vns, config)),
            "favourites" => Some(list_block("Favourites", &result.favourite_vns, config)),
            _ => None,
        })
        .collect();

    blocks.join("\n\n").trim().to_string()
}

fn selected_sections(sections: &serde_json::Value) -> Vec<&str> {
    match sections.as_array() {
        Some(names) => names.iter().filter_map(|name| name.as_str()).collect(),
        None => SECTIONS.to_vec(),
    }
}

fn player_block(player: &UserStats) -> String {
    let title = format!("{} ({})", player.username, player.id);
    format!(
        "{}\n{}\nPlay time: {} | Finished: {} | Playing: {}",
        title,
        "=".repeat(title.chars().count()),
        player.total_play_time,
        player.finished_count,
        player.playing_count
    )
}

fn list_block(heading: &str, entries: &[ListEntry], config: &TextConfig) -> String {
    let mut block = format!("{}\n{}", heading, "-".repeat(heading.len()));

    if entries.is_empty() {
        block.push_str("\n(none)");
        return block;
    }

    for entry in entries {
        block.push_str("\n- ");
        block.push_str(&entry_line(entry));

        if config.include_tags && !entry.tags.is_empty() {
            block.push_str(&format!("\n  tags: {}", entry.tags.join(", ")));
        }
        if config.include_notes && !entry.notes.is_empty() {
            block.push_str(&format!("\n  notes: {}", entry.notes));
        }
    }

    block
}

fn entry_line(entry: &ListEntry) -> String {
    let mut line = if entry.title.is_empty() { entry.vn_id.clone() } else { entry.title.clone() };

    if !entry.alt_title.is_empty() && entry.alt_title != entry.title {
        line.push_str(&format!(" ({})", entry.alt_title));
    }
    if entry.vote != NO_VOTE {
        line.push_str(&format!(" [{}]", entry.vote));
    }

    match (entry.start_date.is_empty(), entry.finish_date.is_empty()) {
        (false, false) => line.push_str(&format!(" {} → {}", entry.start_date, entry.finish_date)),
        (false, true) => line.push_str(&format!(" since {}", entry.start_date)),
        (true, false) => line.push_str(&format!(" finished {}", entry.finish_date)),
        (true, true) => {}
    }

    line
}
