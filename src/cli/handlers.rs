use std::collections::{BTreeSet, HashSet};
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::cache::SqliteCache;
use crate::config::Config;
use crate::entity::Note;
use crate::error::{NotelinkError, Result};
use crate::export::{export_json, export_markdown, import_notes, parse_backup, ImportStrategy};
use crate::mcp::NotelinkServer;
use crate::reference::{backlinks, build_note_context, resolve_references, scan_references};
use crate::render::render_note;
use crate::resolver::{resolve, LinkKind};
use crate::search::{categories, filter_notes, parse_query, sort_notes, SortBy, SortOrder};
use crate::storage::{NoteStore, NoteUpdate, NOTELINK_DIR};
use crate::warnings::{check_thresholds, format_warning};

use super::commands::ExportFormat;

/// Find the project root by looking for .notelink/ or .git/
fn find_project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(NOTELINK_DIR).exists() || current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}

fn open_store() -> Result<NoteStore> {
    NoteStore::open(&find_project_root())
}

fn read_stdin() -> Result<String> {
    let mut content = String::new();
    io::stdin().read_to_string(&mut content)?;
    Ok(content)
}

fn print_threshold_warnings(store: &NoteStore, note_count: usize) -> Result<()> {
    for warning in check_thresholds(note_count, store.file_size()?) {
        eprintln!("{}", format_warning(&warning));
    }
    Ok(())
}

fn print_note_line(note: &Note) {
    let category = if note.category.is_empty() {
        String::new()
    } else {
        format!(" [{}]", note.category)
    };
    println!("  {}{} {}", note.id, category, note.display_title());
    if !note.tags.is_empty() {
        println!("      tags: {}", note.tags.join(", "));
    }
}

pub fn handle_init() -> Result<()> {
    let root = env::current_dir()?;

    let store = NoteStore::init(&root)?;
    Config::default().save(store.notelink_dir())?;

    println!("Initialized notelink project in {}", root.display());

    Ok(())
}

pub fn handle_add(
    title: String,
    content: Option<String>,
    stdin: bool,
    category: Option<String>,
    tags: Vec<String>,
    json: bool,
) -> Result<()> {
    let store = open_store()?;

    let mut note = Note::new(store.next_id()?, title);
    note.category = category.unwrap_or_default();
    note.tags = tags;

    if stdin {
        note.content = read_stdin()?;
    } else if let Some(content) = content {
        note.content = content;
    }

    store.add_note(&note)?;
    store.save()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!("Created note {} - {}", note.id, note.display_title());
    }

    Ok(())
}

pub fn handle_list(
    query: Vec<String>,
    sort_by: Option<SortBy>,
    order: Option<SortOrder>,
    json: bool,
) -> Result<()> {
    let store = open_store()?;
    let config = Config::load(store.notelink_dir());
    let notes = store.list_notes()?;

    let (text, filter) = parse_query(&query.join(" "));
    let mut matched = filter_notes(&notes, &text, &filter);
    sort_notes(
        &mut matched,
        sort_by.unwrap_or(config.sort_by),
        order.unwrap_or(config.sort_order),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&matched)?);
    } else if matched.is_empty() {
        println!("No notes found.");
    } else {
        println!("Notes:\n");
        for note in &matched {
            print_note_line(note);
        }
    }

    print_threshold_warnings(&store, notes.len())?;
    Ok(())
}

pub fn handle_get(id: String, json: bool) -> Result<()> {
    let store = open_store()?;
    let note = store.find_note(&id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
        return Ok(());
    }

    let stats = note.stats();
    println!("Note {}", note.id);
    println!("Title: {}", note.display_title());
    if !note.category.is_empty() {
        println!("Category: {}", note.category);
    }
    if !note.tags.is_empty() {
        println!("Tags: {}", note.tags.join(", "));
    }
    println!("Created: {}", note.created().format("%Y-%m-%d %H:%M"));
    println!("Updated: {}", note.updated().format("%Y-%m-%d %H:%M"));
    println!(
        "Words: {}  Characters: {}  Reading time: {} min",
        stats.words, stats.chars, stats.reading_time
    );
    if !note.attachments.is_empty() {
        println!("Attachments: {}", note.attachments.len());
    }
    if !note.content.is_empty() {
        println!("\n{}", note.content);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn handle_update(
    id: String,
    title: Option<String>,
    content: Option<String>,
    stdin: bool,
    category: Option<String>,
    tags: Vec<String>,
    remove_tags: Vec<String>,
    json: bool,
) -> Result<()> {
    let store = open_store()?;
    let note = store.find_note(&id)?;

    let content = if stdin { Some(read_stdin()?) } else { content };

    let updates = NoteUpdate {
        title,
        content,
        category,
        add_tags: tags,
        remove_tags,
        ..NoteUpdate::default()
    };

    if updates.is_empty() {
        println!("Nothing to update.");
        return Ok(());
    }

    store.update_note(&note.id, updates)?;
    store.save()?;

    let updated = store.find_note(&note.id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        println!("Updated note {} - {}", updated.id, updated.display_title());
    }

    Ok(())
}

pub fn handle_delete(id: String, force: bool) -> Result<()> {
    let store = open_store()?;
    let note = store.find_note(&id)?;

    // Confirm deletion unless --force is used
    if !force {
        let notes = store.list_notes()?;
        let referencing = backlinks(&note.id, &notes).len();

        eprintln!("Delete note {} - {}?", note.id, note.display_title());
        if referencing > 0 {
            eprintln!(
                "  {} other note(s) reference it; those links will show as broken.",
                referencing
            );
        }
        eprintln!("[y/N] ");

        // Check if stdin is a tty for interactive confirmation
        if atty::is(atty::Stream::Stdin) {
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Cancelled.");
                return Ok(());
            }
        } else {
            // Non-interactive mode without --force, abort
            return Err(NotelinkError::Storage(
                "Use --force to delete in non-interactive mode".to_string(),
            ));
        }
    }

    store.delete_note(&note.id)?;
    store.save()?;

    println!("Deleted note {} - {}", note.id, note.display_title());

    Ok(())
}

fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

pub fn handle_attach(id: String, file: PathBuf, append: bool) -> Result<()> {
    let store = open_store()?;
    let note = store.find_note(&id)?;

    let bytes = fs::read(&file)?;
    let data_url = format!("data:{};base64,{}", mime_type(&file), STANDARD.encode(&bytes));
    let attachment_id = uuid::Uuid::new_v4().to_string();
    let alt = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("attachment")
        .to_string();
    let markup = format!("![{}](attachment:{})", alt, attachment_id);

    let mut updates = NoteUpdate::default();
    updates.attachments.insert(attachment_id.clone(), data_url);
    if append {
        let separator = if note.content.is_empty() || note.content.ends_with('\n') {
            ""
        } else {
            "\n"
        };
        updates.content = Some(format!("{}{}{}\n", note.content, separator, markup));
    }

    store.update_note(&note.id, updates)?;
    store.save()?;

    tracing::debug!(id = %note.id, attachment = %attachment_id, bytes = bytes.len(), "attached file");
    println!("Attached {} to note {}", file.display(), note.id);
    println!("{}", markup);

    Ok(())
}

pub fn handle_refs(id: String, json: bool) -> Result<()> {
    let store = open_store()?;
    let note = store.find_note(&id)?;
    let notes = store.list_notes()?;

    let refs = resolve_references(&note, &notes);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "id": note.id,
                "references": refs.found,
                "missing": refs.missing,
            }))?
        );
    } else if refs.found.is_empty() && refs.missing.is_empty() {
        println!("Note {} references no other notes.", note.id);
    } else {
        println!("Notes referenced by {} - {}:\n", note.id, note.display_title());
        for target in &refs.found {
            print_note_line(target);
        }
        for missing in &refs.missing {
            println!("  {} (missing)", missing);
        }
    }

    Ok(())
}

pub fn handle_backlinks(id: String, json: bool) -> Result<()> {
    let store = open_store()?;
    let note = store.find_note(&id)?;
    let notes = store.list_notes()?;

    let linked = backlinks(&note.id, &notes);

    if json {
        println!("{}", serde_json::to_string_pretty(&linked)?);
    } else if linked.is_empty() {
        println!("No notes reference {}.", note.id);
    } else {
        println!("Notes referencing {} - {}:\n", note.id, note.display_title());
        for source in &linked {
            print_note_line(source);
        }
    }

    Ok(())
}

pub fn handle_context(id: String, chars: Option<usize>) -> Result<()> {
    let store = open_store()?;
    let config = Config::load(store.notelink_dir());
    let note = store.find_note(&id)?;
    let notes = store.list_notes()?;

    let snippet_chars = chars.unwrap_or(config.context_snippet_chars);
    println!("{}", build_note_context(&note, &notes, snippet_chars));

    Ok(())
}

pub fn handle_resolve(hrefs: Vec<String>, json: bool) -> Result<()> {
    let store = open_store()?;
    let ids = store.note_ids()?;

    let links: Vec<_> = hrefs.iter().map(|href| resolve(href, Some(&ids))).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&links)?);
        return Ok(());
    }

    for link in &links {
        let status = match &link.kind {
            LinkKind::External => "external",
            LinkKind::Internal { .. } => "internal",
            LinkKind::Broken { .. } => "broken",
        };
        println!("{}\t{}\t{}\t{}", link.href, status, link.label, link.tooltip());
    }

    Ok(())
}

pub fn handle_render(id: String, output: Option<PathBuf>) -> Result<()> {
    let store = open_store()?;
    let note = store.find_note(&id)?;
    let ids = store.note_ids()?;

    let rendered = render_note(&note, Some(&ids));

    match output {
        Some(path) => {
            fs::write(&path, &rendered.html)?;
            println!("Rendered note {} to {}", note.id, path.display());
        }
        None => print!("{}", rendered.html),
    }

    let broken = rendered
        .links
        .iter()
        .filter(|l| matches!(l.kind, LinkKind::Broken { .. }))
        .count();
    if broken > 0 {
        eprintln!("{} broken note reference(s)", broken);
    }

    Ok(())
}

pub fn handle_search(query: String, json: bool) -> Result<()> {
    let store = open_store()?;
    let cache = SqliteCache::open(store.notelink_dir())?;

    // Sync cache with store
    store.sync_cache(&cache)?;

    let results = cache.search_notes(&query, 50)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("No results found for '{}'.", query);
    } else {
        println!("Search results for '{}':\n", query);
        for r in &results {
            println!("  {} {}", r.id, r.title);
            if let Some(snippet) = &r.content_snippet {
                // Clean up FTS5 snippet
                let clean_snippet = snippet
                    .replace("<mark>", "\x1b[1m")
                    .replace("</mark>", "\x1b[0m");
                println!("      {}", clean_snippet);
            }
        }
    }

    print_threshold_warnings(&store, store.note_ids()?.len())?;
    Ok(())
}

pub fn handle_categories(json: bool) -> Result<()> {
    let store = open_store()?;
    let summary = categories(&store.list_notes()?);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.categories.is_empty() && summary.uncategorized == 0 {
        println!("No notes found.");
        return Ok(());
    }

    for (name, count) in &summary.categories {
        println!("  {:<24} {}", name, count);
    }
    if summary.uncategorized > 0 {
        println!("  {:<24} {}", "(uncategorized)", summary.uncategorized);
    }

    Ok(())
}

#[derive(serde::Serialize)]
struct CollectionStats {
    notes: usize,
    words: usize,
    chars: usize,
    categories: usize,
    tags: usize,
    references: usize,
    broken_references: usize,
    store_bytes: u64,
}

pub fn handle_stats(json: bool) -> Result<()> {
    let store = open_store()?;
    let notes = store.list_notes()?;
    let ids: HashSet<&str> = notes.iter().map(|n| n.id.as_str()).collect();

    let mut stats = CollectionStats {
        notes: notes.len(),
        words: 0,
        chars: 0,
        categories: categories(&notes).categories.len(),
        tags: notes
            .iter()
            .flat_map(|n| n.tags.iter())
            .collect::<BTreeSet<_>>()
            .len(),
        references: 0,
        broken_references: 0,
        store_bytes: store.file_size()?,
    };

    for note in &notes {
        let note_stats = note.stats();
        stats.words += note_stats.words;
        stats.chars += note_stats.chars;

        for target in scan_references(&note.content) {
            if target == note.id {
                continue;
            }
            stats.references += 1;
            if !ids.contains(target) {
                stats.broken_references += 1;
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Notes:             {}", stats.notes);
        println!("Words:             {}", stats.words);
        println!("Characters:        {}", stats.chars);
        println!("Categories:        {}", stats.categories);
        println!("Tags:              {}", stats.tags);
        println!("References:        {}", stats.references);
        println!("Broken references: {}", stats.broken_references);
        println!(
            "Store size:        {:.1} KB",
            stats.store_bytes as f64 / 1024.0
        );
    }

    print_threshold_warnings(&store, notes.len())?;
    Ok(())
}

pub fn handle_export(path: Option<PathBuf>, format: ExportFormat) -> Result<()> {
    let store = open_store()?;

    match format {
        ExportFormat::Markdown => {
            let dir = path.unwrap_or_else(|| store.notelink_dir().join("export"));
            let config = Config::load(store.notelink_dir());
            let stats = export_markdown(&store, &dir, config.user_name.as_deref())?;
            println!(
                "Exported {} notes ({} files) to {}",
                stats.notes,
                stats.files_generated.len(),
                dir.display()
            );
        }
        ExportFormat::Json => {
            let notes = store.list_notes()?;
            let count = notes.len();
            let config = Config::load(store.notelink_dir());
            let json = export_json(notes, Some(&config))?;
            match path {
                Some(file) => {
                    fs::write(&file, json)?;
                    println!("Exported {} notes to {}", count, file.display());
                }
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}

pub fn handle_import(
    file: PathBuf,
    strategy: ImportStrategy,
    keep_config: bool,
    json: bool,
) -> Result<()> {
    let store = open_store()?;
    let text = fs::read_to_string(&file)?;
    let backup = parse_backup(&text)?;

    let report = import_notes(&store, backup.notes, strategy)?;
    store.save()?;

    let restored_config = match backup.config {
        Some(config) if !keep_config => {
            config.save(store.notelink_dir())?;
            tracing::info!("restored settings from backup");
            true
        }
        _ => false,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Imported {} notes from {}: {} added, {} overwritten, {} kept as copies, {} skipped",
            report.total(),
            file.display(),
            report.added,
            report.overwritten,
            report.renamed,
            report.skipped
        );
        if restored_config {
            println!("Restored settings from backup");
        }
    }

    Ok(())
}

pub fn handle_serve() -> Result<()> {
    let store = open_store()?;
    let cache = SqliteCache::open(store.notelink_dir())?;
    let config = Config::load(store.notelink_dir());

    let server = NotelinkServer::new(store, cache, config);
    let runtime = tokio::runtime::Runtime::new()?;

    runtime
        .block_on(server.serve(rmcp::transport::stdio()))
        .map_err(|e| NotelinkError::Storage(format!("MCP server error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type() {
        assert_eq!(mime_type(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_type(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(mime_type(Path::new("noext")), "application/octet-stream");
    }
}
