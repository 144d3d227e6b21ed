//! Vertical card display for analysis records.
//!
//! Prints a canonical record as grouped, human-readable sections with
//! bounded list output.

use resumelens_core::{
    CanonicalRecord, FieldResolutionWarning, HighlightKind, HighlightSkipped, SectionFeedback,
};

const MAX_LIST_ITEMS: usize = 10;
const MAX_LINE_CHARS: usize = 60;

// ── Public API ──

/// Print a record as a vertical card.
pub fn print_record_card(record: &CanonicalRecord) {
    let job = &record.job;
    if job.company.is_empty() {
        println!("=== {} ===", job.title);
    } else {
        println!("=== {} at {} ===", job.title, job.company);
    }
    if !job.level.is_empty() {
        println!("{}", job.level);
    }
    println!();

    println!("Scores");
    println!("  {:<26} {}", "original", record.original_score);
    println!("  {:<26} {}", "optimized", record.optimized_score);
    println!();

    println!("Section Feedback");
    for section in &record.section_feedback {
        print_feedback(section);
    }
    println!();

    let skills: Vec<String> = record
        .missing_skills
        .iter()
        .map(|s| match &s.priority {
            Some(p) => format!("{} ({p})", s.skill),
            None => s.skill.clone(),
        })
        .collect();
    print_list("Missing Skills", &skills);

    if !record.career_paths.is_empty() {
        println!("Career Paths");
        for path in record.career_paths.iter().take(MAX_LIST_ITEMS) {
            println!("  {}", path.title);
            if !path.description.is_empty() {
                println!("    {}", truncate(&path.description, MAX_LINE_CHARS));
            }
            if !path.required_skills.is_empty() {
                println!("    skills: {}", path.required_skills.join(", "));
            }
        }
        print_overflow(record.career_paths.len());
        println!();
    }

    print_highlight_counts(record);

    if let Some(grounding) = &record.grounding_metadata {
        print_list("Search Queries", &grounding.queries);
    }
}

/// Print non-fatal conditions met while building and rendering a record.
pub fn print_diagnostics(warnings: &[FieldResolutionWarning], skipped: &[HighlightSkipped]) {
    if warnings.is_empty() && skipped.is_empty() {
        return;
    }
    println!("Diagnostics");
    for w in warnings {
        println!("  {w}");
    }
    for s in skipped {
        println!("  {s}");
    }
    println!();
}

// ── Section rendering ──

fn print_feedback(section: &SectionFeedback) {
    println!("  {}", section.section);
    print_items("+", &section.matches);
    print_items("-", &section.misses);
    for line in section.suggestions.lines().take(MAX_LIST_ITEMS) {
        println!("    > {}", truncate(line, MAX_LINE_CHARS));
    }
}

fn print_items(marker: &str, items: &[String]) {
    for item in items.iter().take(MAX_LIST_ITEMS) {
        println!("    {marker} {}", truncate(item, MAX_LINE_CHARS));
    }
    print_overflow(items.len());
}

fn print_list(header: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{header} ({}):", items.len());
    for item in items.iter().take(MAX_LIST_ITEMS) {
        println!("  {}", truncate(item, MAX_LINE_CHARS));
    }
    print_overflow(items.len());
    println!();
}

fn print_overflow(len: usize) {
    if len > MAX_LIST_ITEMS {
        println!("    ... and {} more", len - MAX_LIST_ITEMS);
    }
}

fn print_highlight_counts(record: &CanonicalRecord) {
    if record.highlights.is_empty() {
        return;
    }
    println!("Highlights");
    for kind in [
        HighlightKind::Modified,
        HighlightKind::Removed,
        HighlightKind::Retained,
    ] {
        let count = record.highlights.iter().filter(|h| h.kind == kind).count();
        if count > 0 {
            println!("  {:<26} {}", kind.as_str(), count);
        }
    }
    println!();
}

/// Shorten `s` to `max` chars, marking the cut with `...`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
