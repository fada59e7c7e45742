use clap::Parser;
use notelink::cli::{
    handle_add, handle_attach, handle_backlinks, handle_categories, handle_context, handle_delete,
    handle_export, handle_get, handle_import, handle_init, handle_list, handle_refs,
    handle_render, handle_resolve, handle_search, handle_serve, handle_stats, handle_update, Cli,
    Commands,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    // stdout carries command output and the MCP protocol, so logs go to stderr
    let filter = EnvFilter::try_from_env("NOTELINK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => handle_init(),
        Commands::Add {
            title,
            content,
            stdin,
            category,
            tags,
            json,
        } => handle_add(title, content, stdin, category, tags, json),
        Commands::List {
            query,
            sort_by,
            order,
            json,
        } => handle_list(query, sort_by, order, json),
        Commands::Get { id, json } => handle_get(id, json),
        Commands::Update {
            id,
            title,
            content,
            stdin,
            category,
            tags,
            remove_tags,
            json,
        } => handle_update(id, title, content, stdin, category, tags, remove_tags, json),
        Commands::Delete { id, force } => handle_delete(id, force),
        Commands::Attach { id, file, append } => handle_attach(id, file, append),
        Commands::Refs { id, json } => handle_refs(id, json),
        Commands::Backlinks { id, json } => handle_backlinks(id, json),
        Commands::Context { id, chars } => handle_context(id, chars),
        Commands::Resolve { hrefs, json } => handle_resolve(hrefs, json),
        Commands::Render { id, output } => handle_render(id, output),
        Commands::Search { query, json } => handle_search(query, json),
        Commands::Categories { json } => handle_categories(json),
        Commands::Stats { json } => handle_stats(json),
        Commands::Export { path, format } => handle_export(path, format),
        Commands::Import {
            file,
            strategy,
            keep_config,
            json,
        } => handle_import(file, strategy, keep_config, json),
        Commands::Serve => handle_serve(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
