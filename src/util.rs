/// Format a millisecond duration as m:ss for the HUD and end screen
pub fn format_time(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Format a probability as a percentage with one decimal
pub fn format_pct(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}
