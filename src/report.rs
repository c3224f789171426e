// Dry-run reporting and plan export

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::db::store::QueueEntry;
use crate::engine::plan::MutationPlan;
use crate::error::Result;

/// Print the active queue in rank order.
pub fn print_queue(queue: &[QueueEntry]) {
    if queue.is_empty() {
        println!("  (queue is empty)");
        return;
    }

    println!("{:>10}  {:>6}  {}", "Rank", "ID", "Title");
    println!("{}", "-".repeat(60));

    let mut sorted: Vec<&QueueEntry> = queue.iter().collect();
    sorted.sort_by(|a, b| a.rank.total_cmp(&b.rank));
    for entry in sorted {
        println!(
            "{:>10.3}  {:>6}  {}",
            entry.rank,
            entry.id,
            display_title(&entry.title, entry.series_title.as_deref())
        );
    }
}

/// Print the current queue and the queue as it would look after the plan,
/// with planned additions marked.
pub fn print_dry_run(queue: &[QueueEntry], plan: &MutationPlan) {
    println!();
    println!("DRY RUN - the following items would be re-queued:");
    println!();
    println!("Current queue:");
    print_queue(queue);

    println!();
    println!("Proposed queue ('+' marks additions):");
    println!("{:>10}  {:>6}  {:>1}  {}", "Rank", "ID", "", "Title");
    println!("{}", "-".repeat(60));

    let mut merged: Vec<(f64, i64, String, bool)> = queue
        .iter()
        .map(|q| {
            (
                q.rank,
                q.id,
                display_title(&q.title, q.series_title.as_deref()),
                false,
            )
        })
        .collect();
    merged.extend(plan.entries.iter().map(|e| {
        (
            e.new_rank,
            e.record_id,
            display_title(&e.title, e.series_title.as_deref()),
            true,
        )
    }));
    merged.sort_by(|a, b| a.0.total_cmp(&b.0));

    for (rank, id, title, is_new) in merged {
        let marker = if is_new { "+" } else { " " };
        println!("{:>10.3}  {:>6}  {:>1}  {}", rank, id, marker, title);
    }

    println!();
    println!(
        "Scanned {} candidate row(s); {} matched; {} selected.",
        plan.candidates_scanned,
        plan.matched,
        plan.selected()
    );
}

/// Write the proposed additions to a file: a JSON array for `.json` paths,
/// CSV with fixed columns otherwise.
pub fn export_plan(plan: &MutationPlan, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let as_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if as_json {
        serde_json::to_writer_pretty(&mut writer, &plan.entries)?;
        writer.write_all(b"\n")?;
    } else {
        writeln!(writer, "ID,Title,SeriesTitle,Season,Episode,NewRank")?;
        for entry in &plan.entries {
            writeln!(
                writer,
                "{},{},{},{},{},{}",
                entry.record_id,
                csv_field(&entry.title),
                csv_field(entry.series_title.as_deref().unwrap_or("")),
                entry.season.map(|v| v.to_string()).unwrap_or_default(),
                entry.episode.map(|v| v.to_string()).unwrap_or_default(),
                entry.new_rank
            )?;
        }
    }

    writer.flush()?;
    Ok(())
}

fn display_title(title: &str, series_title: Option<&str>) -> String {
    match series_title {
        Some(series) if series != title => format!("{} - {}", series, title),
        _ => title.to_string(),
    }
}

fn csv_field(value: &str) -> String {
    let needs_quoting = value
        .chars()
        .any(|c| matches!(c, ',' | '"' | '\n' | '\r'));
    if needs_quoting {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
