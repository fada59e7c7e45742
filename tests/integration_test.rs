use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn notelink_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_notelink"))
}

fn run(dir: &Path, args: &[&str]) -> Output {
    notelink_cmd().current_dir(dir).args(args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn init(dir: &Path) {
    let output = run(dir, &["init"]);
    assert!(output.status.success());
}

/// Seed two notes with fixed ids through a JSON backup.
fn seed_intro_pair(dir: &Path) {
    let backup = r#"{
        "version": 1,
        "exportedAt": "2025-01-01T00:00:00Z",
        "notes": [
            {"id": "100000001", "title": "Overview", "content": "See [Intro](100000002)",
             "tags": ["start"], "createdAt": 1000, "updatedAt": 1000},
            {"id": "100000002", "title": "Intro", "content": "Hello there",
             "createdAt": 2000, "updatedAt": 2000}
        ]
    }"#;
    std::fs::write(dir.join("seed.json"), backup).unwrap();
    let output = run(dir, &["import", "seed.json"]);
    assert!(output.status.success());
}

#[test]
fn test_init_creates_notelink_directory() {
    let tmp = TempDir::new().unwrap();
    init(tmp.path());

    assert!(tmp.path().join(".notelink").exists());
    assert!(tmp.path().join(".notelink/loro.db").exists());
    assert!(tmp.path().join(".notelink/config.json").exists());
}

#[test]
fn test_init_twice_fails() {
    let tmp = TempDir::new().unwrap();
    init(tmp.path());

    let output = run(tmp.path(), &["init"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Already initialized"));
}

#[test]
fn test_add_without_init_fails() {
    let tmp = TempDir::new().unwrap();

    let output = run(tmp.path(), &["add", "Test"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Not in a notelink project"));
}

#[test]
fn test_add_list_get_update() {
    let tmp = TempDir::new().unwrap();
    init(tmp.path());

    let output = run(
        tmp.path(),
        &["add", "Rust notes", "--content", "Ownership", "--tag=lang", "--category=study"],
    );
    assert!(output.status.success());
    assert!(stdout(&output).contains("Created note 100000000"));

    let output = run(tmp.path(), &["add", "Groceries"]);
    assert!(stdout(&output).contains("Created note 100000001"));

    let output = run(tmp.path(), &["list", "tag:lang"]);
    let out = stdout(&output);
    assert!(out.contains("100000000 [study] Rust notes"));
    assert!(!out.contains("Groceries"));

    let output = run(tmp.path(), &["list", "--json"]);
    let notes: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(notes.as_array().unwrap().len(), 2);

    let output = run(
        tmp.path(),
        &["update", "100000000", "--title", "Rust", "--remove-tag", "lang", "--json"],
    );
    assert!(output.status.success());
    let note: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(note["title"], "Rust");
    assert_eq!(note["tags"].as_array().unwrap().len(), 0);

    let output = run(tmp.path(), &["get", "100000000"]);
    let out = stdout(&output);
    assert!(out.contains("Title: Rust"));
    assert!(out.contains("Category: study"));
    assert!(out.contains("Ownership"));
}

#[test]
fn test_get_ambiguous_prefix_fails() {
    let tmp = TempDir::new().unwrap();
    init(tmp.path());
    run(tmp.path(), &["add", "One"]);
    run(tmp.path(), &["add", "Two"]);

    let output = run(tmp.path(), &["get", "1000"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Ambiguous"));
}

#[test]
fn test_reference_lifecycle_valid_then_broken() {
    let tmp = TempDir::new().unwrap();
    init(tmp.path());
    seed_intro_pair(tmp.path());

    // B exists: A's link is a valid internal reference
    let output = run(tmp.path(), &["resolve", "100000002", "--json"]);
    let links: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(links[0]["kind"], "internal");
    assert_eq!(links[0]["id"], "100000002");

    let output = run(tmp.path(), &["render", "100000001"]);
    let html = stdout(&output);
    assert!(html.contains(r#"class="note-ref" data-note-id="100000002""#));

    let output = run(tmp.path(), &["backlinks", "100000002"]);
    assert!(stdout(&output).contains("100000001"));

    let output = run(tmp.path(), &["refs", "100000001", "--json"]);
    let refs: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(refs["references"][0]["id"], "100000002");

    // Delete B: the same link is now broken
    let output = run(tmp.path(), &["delete", "100000002", "--force"]);
    assert!(output.status.success());

    let output = run(tmp.path(), &["resolve", "100000002", "--json"]);
    let links: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(links[0]["kind"], "broken");

    let output = run(tmp.path(), &["render", "100000001"]);
    let html = stdout(&output);
    assert!(html.contains("note-ref-broken"));
    assert!(!html.contains(r#"class="note-ref""#));
    assert!(String::from_utf8_lossy(&output.stderr).contains("1 broken note reference"));

    let output = run(tmp.path(), &["refs", "100000001", "--json"]);
    let refs: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(refs["missing"][0], "100000002");
}

#[test]
fn test_resolve_external_link() {
    let tmp = TempDir::new().unwrap();
    init(tmp.path());

    let output = run(tmp.path(), &["resolve", "https://example.com/page"]);
    let out = stdout(&output);
    assert!(out.contains("external"));
    assert!(out.contains("example.com"));
}

#[test]
fn test_delete_non_interactive_requires_force() {
    let tmp = TempDir::new().unwrap();
    init(tmp.path());
    run(tmp.path(), &["add", "Keep me"]);

    let output = run(tmp.path(), &["delete", "100000000"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--force"));

    let output = run(tmp.path(), &["get", "100000000"]);
    assert!(output.status.success());
}

#[test]
fn test_context_includes_referenced_notes() {
    let tmp = TempDir::new().unwrap();
    init(tmp.path());
    seed_intro_pair(tmp.path());

    let output = run(tmp.path(), &["context", "100000001"]);
    let out = stdout(&output);
    assert!(out.starts_with("Title: Overview\nTags: start"));
    assert!(out.contains("Reference ID: 100000002"));
    assert!(out.contains("Hello there"));
    assert!(out.contains("See [Intro](100000002)"));
}

#[test]
fn test_search_fulltext() {
    let tmp = TempDir::new().unwrap();
    init(tmp.path());
    run(tmp.path(), &["add", "Borrow checker", "--content", "lifetimes explained"]);
    run(tmp.path(), &["add", "Shopping"]);

    let output = run(tmp.path(), &["search", "lifetimes", "--json"]);
    assert!(output.status.success());
    let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(results.as_array().unwrap().len(), 1);
    assert_eq!(results[0]["title"], "Borrow checker");
}

#[test]
fn test_export_import_keep_both() {
    let tmp = TempDir::new().unwrap();
    init(tmp.path());
    run(tmp.path(), &["add", "Original"]);

    let output = run(tmp.path(), &["export", "backup.json", "--format", "json"]);
    assert!(output.status.success());
    assert!(tmp.path().join("backup.json").exists());

    let output = run(tmp.path(), &["import", "backup.json", "--json"]);
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["renamed"], 1);

    let output = run(tmp.path(), &["list"]);
    assert!(stdout(&output).contains("Original (Imported)"));

    let output = run(tmp.path(), &["import", "backup.json", "--strategy", "skip", "--json"]);
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["skipped"], 1);
}

#[test]
fn test_export_markdown() {
    let tmp = TempDir::new().unwrap();
    init(tmp.path());
    run(tmp.path(), &["add", "Reading list", "--category", "books"]);

    let out_dir = tmp.path().join("md");
    let output = run(tmp.path(), &["export", out_dir.to_str().unwrap()]);
    assert!(output.status.success());

    assert!(out_dir.join("reading-list.md").exists());
    let readme = std::fs::read_to_string(out_dir.join("README.md")).unwrap();
    assert!(readme.contains("## books"));
}

#[test]
fn test_attach_appends_image_reference() {
    let tmp = TempDir::new().unwrap();
    init(tmp.path());
    run(tmp.path(), &["add", "Photo", "--content", "Look:"]);
    std::fs::write(tmp.path().join("pic.png"), [0x89, b'P', b'N', b'G']).unwrap();

    let output = run(tmp.path(), &["attach", "100000000", "pic.png", "--append"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("![pic](attachment:"));

    let output = run(tmp.path(), &["render", "100000000"]);
    assert!(stdout(&output).contains("data:image/png;base64,"));
}

#[test]
fn test_categories_and_stats() {
    let tmp = TempDir::new().unwrap();
    init(tmp.path());
    seed_intro_pair(tmp.path());
    run(tmp.path(), &["add", "Work item", "--category", "work"]);

    let output = run(tmp.path(), &["categories", "--json"]);
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["categories"]["work"], 1);
    assert_eq!(summary["uncategorized"], 2);

    let output = run(tmp.path(), &["stats", "--json"]);
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["notes"], 3);
    assert_eq!(stats["references"], 1);
    assert_eq!(stats["broken_references"], 0);
}

#[test]
fn test_search_chinese_text() {
    let tmp = TempDir::new().unwrap();
    init(tmp.path());
    run(tmp.path(), &["add", "学习记录", "--content", "今天整理了这是笔记内容"]);
    run(tmp.path(), &["add", "会议", "--content", "下周计划"]);

    let output = run(tmp.path(), &["search", "笔记", "--json"]);
    assert!(output.status.success());
    let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(results.as_array().unwrap().len(), 1);
    assert_eq!(results[0]["title"], "学习记录");
}

#[test]
fn test_backup_restores_settings() {
    let source = TempDir::new().unwrap();
    init(source.path());
    run(source.path(), &["add", "Carried"]);
    std::fs::write(
        source.path().join(".notelink/config.json"),
        r#"{"user_name": "Ada", "context_snippet_chars": 200}"#,
    )
    .unwrap();
    let backup = source.path().join("backup.json");
    let output = run(source.path(), &["export", backup.to_str().unwrap(), "--format", "json"]);
    assert!(output.status.success());

    let target = TempDir::new().unwrap();
    init(target.path());
    let output = run(target.path(), &["import", backup.to_str().unwrap()]);
    assert!(stdout(&output).contains("Restored settings"));
    let config: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(target.path().join(".notelink/config.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(config["user_name"], "Ada");
    assert_eq!(config["context_snippet_chars"], 200);

    let kept = TempDir::new().unwrap();
    init(kept.path());
    let output = run(
        kept.path(),
        &["import", backup.to_str().unwrap(), "--keep-config"],
    );
    assert!(!stdout(&output).contains("Restored settings"));
    let config: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(kept.path().join(".notelink/config.json")).unwrap(),
    )
    .unwrap();
    assert!(config["user_name"].is_null());
}
