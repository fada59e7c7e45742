//! MCP (Model Context Protocol) server implementation for notelink.
//!
//! Exposes the note collection and its cross-reference graph (references,
//! backlinks, link resolution and context assembly) to AI tools over stdio.

pub mod error;
pub mod tools;

use crate::cache::SqliteCache;
use crate::config::Config;
use crate::entity::Note;
use crate::reference::{backlinks, build_note_context, resolve_references};
use crate::resolver::resolve;
use crate::search::{filter_notes, parse_query, sort_notes};
use crate::storage::NoteStore;
use error::McpError;
use rmcp::{
    handler::server::wrapper::Parameters, model::*, service::RoleServer, tool, tool_handler,
    tool_router, ErrorData as McpErrorData, ServerHandler,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tools::*;

/// The MCP server for notelink.
///
/// Holds thread-safe references to the storage layer. Every tool call works
/// on a fresh snapshot taken under the store lock.
#[derive(Clone)]
pub struct NotelinkServer {
    /// The Loro CRDT store for notes.
    pub store: Arc<Mutex<NoteStore>>,
    /// The SQLite cache for full-text search.
    pub cache: Arc<Mutex<SqliteCache>>,
    pub config: Arc<Config>,
    /// Tool router for MCP tool handling.
    pub tool_router: rmcp::handler::server::tool::ToolRouter<Self>,
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpErrorData> {
    let json = serde_json::to_string_pretty(value).map_err(|e| McpError::InternalError {
        message: format!("Failed to serialize response: {}", e),
    })?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn lookup(store: &NoteStore, id: &str) -> Result<Note, McpError> {
    validate_id(id)?;
    store.find_note(id.trim()).map_err(McpError::from)
}

#[tool_router]
impl NotelinkServer {
    /// Create a new NotelinkServer instance.
    pub fn new(store: NoteStore, cache: SqliteCache, config: Config) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            cache: Arc::new(Mutex::new(cache)),
            config: Arc::new(config),
            tool_router: Self::tool_router(),
        }
    }

    /// Start the MCP server on the given transport.
    ///
    /// Runs until the transport is closed or an error occurs.
    pub async fn serve<T, E, A>(
        self,
        transport: T,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        T: rmcp::transport::IntoTransport<RoleServer, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        use rmcp::service::ServiceExt;
        let running = ServiceExt::serve(self, transport)
            .await
            .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?;
        tracing::info!("mcp server running");
        running
            .waiting()
            .await
            .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?;
        Ok(())
    }

    /// Ping tool for health checks.
    #[tool(description = "Check if the server is running")]
    async fn ping(&self) -> Result<CallToolResult, McpErrorData> {
        Ok(CallToolResult::success(vec![Content::text("pong")]))
    }

    /// Get a single note.
    #[tool(description = "Get a note by id (9-10 digits) or unique id prefix")]
    pub async fn note_get(
        &self,
        Parameters(params): Parameters<NoteIdParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let store = self.store.lock().await;
        let note = lookup(&store, &params.id)?;
        json_result(&note_to_response(&note))
    }

    /// List notes with optional filters.
    #[tool(
        description = "List notes, optionally filtered by a query (supports tag:, category:, created:> and created:< prefixes), sorted and paginated"
    )]
    pub async fn note_list(
        &self,
        Parameters(params): Parameters<NoteListParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let sort_by = match params.sort_by.as_deref() {
            Some(s) => parse_sort_by(s)?,
            None => self.config.sort_by,
        };
        let sort_order = match params.sort_order.as_deref() {
            Some(s) => parse_sort_order(s)?,
            None => self.config.sort_order,
        };
        let limit = clamp_limit(params.limit);
        let offset = params.offset.unwrap_or(0) as usize;

        let store = self.store.lock().await;
        let notes = store.list_notes().map_err(McpError::from)?;

        let (text, filter) = parse_query(params.query.as_deref().unwrap_or(""));
        let mut matched = filter_notes(&notes, &text, &filter);
        sort_notes(&mut matched, sort_by, sort_order);

        let total = matched.len();
        let page: Vec<NoteSummary> = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(note_to_summary)
            .collect();

        json_result(&serde_json::json!({
            "notes": page,
            "total": total,
            "limit": limit,
            "offset": offset,
        }))
    }

    /// Notes this note references.
    #[tool(
        description = "List the notes a note references (note://<id> or ](<id>) links). Ids with no matching note are reported as missing"
    )]
    pub async fn note_references(
        &self,
        Parameters(params): Parameters<NoteIdParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let store = self.store.lock().await;
        let note = lookup(&store, &params.id)?;
        let notes = store.list_notes().map_err(McpError::from)?;

        let refs = resolve_references(&note, &notes);
        let found: Vec<NoteSummary> = refs.found.into_iter().map(note_to_summary).collect();

        json_result(&serde_json::json!({
            "id": note.id,
            "references": found,
            "missing": refs.missing,
        }))
    }

    /// Notes that reference this note.
    #[tool(description = "List the other notes that reference a note")]
    pub async fn note_backlinks(
        &self,
        Parameters(params): Parameters<NoteIdParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let store = self.store.lock().await;
        let note = lookup(&store, &params.id)?;
        let notes = store.list_notes().map_err(McpError::from)?;

        let linked: Vec<NoteSummary> = backlinks(&note.id, &notes)
            .into_iter()
            .map(note_to_summary)
            .collect();

        json_result(&serde_json::json!({
            "id": note.id,
            "total": linked.len(),
            "backlinks": linked,
        }))
    }

    /// Context bundle for an assistant prompt.
    #[tool(
        description = "Build a plain-text context block for a note: its title and tags, excerpts of every note it references, then its full content"
    )]
    pub async fn note_context(
        &self,
        Parameters(params): Parameters<NoteContextParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        let snippet_chars = params
            .snippet_chars
            .map(|n| n as usize)
            .unwrap_or(self.config.context_snippet_chars);

        let store = self.store.lock().await;
        let note = lookup(&store, &params.id)?;
        let notes = store.list_notes().map_err(McpError::from)?;

        let context = build_note_context(&note, &notes, snippet_chars);
        Ok(CallToolResult::success(vec![Content::text(context)]))
    }

    /// Classify link targets against the current collection.
    #[tool(
        description = "Classify link targets as external, internal (note exists) or broken (note missing)"
    )]
    pub async fn link_resolve(
        &self,
        Parameters(params): Parameters<LinkResolveParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        if params.hrefs.is_empty() {
            return Err(McpError::ValidationFailed {
                field: "hrefs".to_string(),
                message: "At least one href is required".to_string(),
            }
            .into());
        }

        let store = self.store.lock().await;
        let ids = store.note_ids().map_err(McpError::from)?;

        let links: Vec<_> = params
            .hrefs
            .iter()
            .map(|href| {
                let link = resolve(href, Some(&ids));
                let tooltip = link.tooltip();
                serde_json::json!({
                    "link": link,
                    "tooltip": tooltip,
                })
            })
            .collect();

        json_result(&serde_json::json!({ "links": links }))
    }

    /// Full-text search across notes.
    #[tool(description = "Full-text search across note titles, content, categories and tags via SQLite FTS5")]
    pub async fn search_fulltext(
        &self,
        Parameters(params): Parameters<SearchFulltextParams>,
    ) -> Result<CallToolResult, McpErrorData> {
        validate_query(&params.query)?;
        let limit = clamp_limit(params.limit);

        let store = self.store.lock().await;
        let cache = self.cache.lock().await;
        store.sync_cache(&cache).map_err(McpError::from)?;

        let results = cache
            .search_notes(&params.query, limit)
            .map_err(McpError::from)?;

        json_result(&serde_json::json!({
            "results": results,
            "total": results.len(),
            "query": params.query,
        }))
    }
}

#[tool_handler]
impl ServerHandler for NotelinkServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "notelink is a Markdown note store. Notes reference each other with \
                 note://<id> links or [text](<id>) links, where an id is 9-10 digits. \
                 Use note_references and note_backlinks to walk the reference graph, \
                 note_context to gather a note with the notes it cites, and \
                 link_resolve to check whether links are still valid."
                    .to_string(),
            ),
        }
    }
}
