use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::export::ImportStrategy;
use crate::search::{SortBy, SortOrder};

#[derive(Parser, Debug)]
#[command(name = "notelink")]
#[command(version, about = "A local Markdown note store with note references and backlinks")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new notelink project in the current directory
    Init,

    /// Add a new note
    Add {
        /// Note title
        title: String,

        /// Note content (Markdown)
        #[arg(long, short = 'c', conflicts_with = "stdin")]
        content: Option<String>,

        /// Read content from stdin
        #[arg(long)]
        stdin: bool,

        /// Category
        #[arg(long)]
        category: Option<String>,

        /// Tags (can be specified multiple times)
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List notes, optionally filtered
    List {
        /// Filter text; supports tag:, category:, created:> and created:< prefixes
        query: Vec<String>,

        /// Sort key (defaults to the configured one)
        #[arg(long, value_enum)]
        sort_by: Option<SortBy>,

        /// Sort order (defaults to the configured one)
        #[arg(long, value_enum)]
        order: Option<SortOrder>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single note
    Get {
        /// Note id or unique id prefix
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update an existing note
    Update {
        /// Note id or unique id prefix
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New content
        #[arg(long, short = 'c', conflicts_with = "stdin")]
        content: Option<String>,

        /// Read new content from stdin
        #[arg(long)]
        stdin: bool,

        /// New category (empty string clears it)
        #[arg(long)]
        category: Option<String>,

        /// Tags to add (can be specified multiple times)
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,

        /// Tags to remove (can be specified multiple times)
        #[arg(long = "remove-tag")]
        remove_tags: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a note
    Delete {
        /// Note id or unique id prefix
        id: String,

        /// Skip confirmation
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Attach a file to a note as an embedded data URL
    Attach {
        /// Note id or unique id prefix
        id: String,

        /// File to attach
        file: PathBuf,

        /// Also append the image reference to the note content
        #[arg(long)]
        append: bool,
    },

    /// List the notes a note references
    Refs {
        /// Note id or unique id prefix
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the notes that reference a note
    Backlinks {
        /// Note id or unique id prefix
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a note with the notes it references, as assistant context
    Context {
        /// Note id or unique id prefix
        id: String,

        /// Characters of each referenced note to include
        #[arg(long)]
        chars: Option<usize>,
    },

    /// Classify link targets against the collection
    Resolve {
        /// Link targets, e.g. note://123456789 or https://example.com
        #[arg(required = true)]
        hrefs: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render a note to HTML
    Render {
        /// Note id or unique id prefix
        id: String,

        /// Write HTML to this file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Full-text search across notes
    Search {
        /// Search query
        query: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show categories and note counts
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show collection statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the collection
    Export {
        /// Target directory (markdown) or file (json); json defaults to stdout
        path: Option<PathBuf>,

        /// Export format
        #[arg(long, value_enum, default_value = "markdown")]
        format: ExportFormat,
    },

    /// Import notes from a JSON backup
    Import {
        /// Backup file
        file: PathBuf,

        /// What to do with notes whose id already exists
        #[arg(long, value_enum, default_value = "keep-both")]
        strategy: ImportStrategy,

        /// Keep local settings even if the backup carries its own
        #[arg(long)]
        keep_config: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the MCP server on stdio
    Serve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Markdown,
    Json,
}
