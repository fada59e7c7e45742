//! MCP tool types and helpers.
//!
//! This module contains parameter types, result types, and validation helpers
//! for MCP tools. The actual tool implementations are in mod.rs within the
//! #[tool_router] impl block.

use crate::entity::{Note, NoteStats};
use crate::mcp::error::{validation, McpError};
use crate::search::{SortBy, SortOrder};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// Parameter and Result Types
// ============================================================================

/// Parameters for tools that address a single note
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NoteIdParams {
    /// Note id (9-10 digits) or a unique prefix of at least 4 digits
    pub id: String,
}

/// Parameters for note_list tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NoteListParams {
    /// Substring filter over title, content and tags. Supports
    /// `tag:`, `category:`, `created:>` and `created:<` prefixes.
    pub query: Option<String>,
    /// Sort key: updated, created, title, category or tag-count
    pub sort_by: Option<String>,
    /// Sort order: asc or desc
    pub sort_order: Option<String>,
    /// Maximum results (default 50, max 100)
    pub limit: Option<u32>,
    /// Offset for pagination
    pub offset: Option<u32>,
}

/// Parameters for note_context tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NoteContextParams {
    /// Note id or unique prefix
    pub id: String,
    /// Characters of each referenced note to include (default from config)
    pub snippet_chars: Option<u32>,
}

/// Parameters for link_resolve tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LinkResolveParams {
    /// Link targets to classify, e.g. `note://123456789` or `https://example.com`
    pub hrefs: Vec<String>,
}

/// Parameters for search_fulltext tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchFulltextParams {
    /// Search query
    pub query: String,
    /// Maximum results (default 50, max 100)
    pub limit: Option<u32>,
}

/// A note in response format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub words: usize,
    pub reading_time: usize,
}

/// A note without its body, for list-style responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: String,
    pub title: String,
    pub category: String,
    pub tags: Vec<String>,
    pub updated_at: String,
}

// ============================================================================
// Validation Helpers
// ============================================================================

pub fn validate_id(id: &str) -> Result<(), McpError> {
    let trimmed = id.trim();
    if trimmed.len() < validation::MIN_ID_PREFIX_LENGTH {
        return Err(McpError::ValidationFailed {
            field: "id".to_string(),
            message: format!(
                "id must be at least {} characters",
                validation::MIN_ID_PREFIX_LENGTH
            ),
        });
    }
    Ok(())
}

pub fn validate_query(query: &str) -> Result<(), McpError> {
    if query.trim().is_empty() {
        return Err(McpError::ValidationFailed {
            field: "query".to_string(),
            message: "Search query cannot be empty".to_string(),
        });
    }
    Ok(())
}

pub fn clamp_limit(limit: Option<u32>) -> usize {
    limit
        .map(|l| l as usize)
        .unwrap_or(validation::DEFAULT_LIMIT)
        .min(validation::MAX_LIMIT)
}

pub fn parse_sort_by(s: &str) -> Result<SortBy, McpError> {
    match s.to_lowercase().as_str() {
        "updated" => Ok(SortBy::Updated),
        "created" => Ok(SortBy::Created),
        "title" => Ok(SortBy::Title),
        "category" => Ok(SortBy::Category),
        "tag-count" | "tag_count" => Ok(SortBy::TagCount),
        _ => Err(McpError::ValidationFailed {
            field: "sort_by".to_string(),
            message: format!(
                "'{}' is not one of updated, created, title, category, tag-count",
                s
            ),
        }),
    }
}

pub fn parse_sort_order(s: &str) -> Result<SortOrder, McpError> {
    match s.to_lowercase().as_str() {
        "asc" => Ok(SortOrder::Asc),
        "desc" => Ok(SortOrder::Desc),
        _ => Err(McpError::ValidationFailed {
            field: "sort_order".to_string(),
            message: format!("'{}' is not one of asc, desc", s),
        }),
    }
}

// ============================================================================
// Response Conversions
// ============================================================================

pub fn note_to_response(n: &Note) -> NoteResponse {
    let NoteStats {
        words,
        reading_time,
        ..
    } = n.stats();
    NoteResponse {
        id: n.id.clone(),
        title: n.title.clone(),
        content: n.content.clone(),
        category: n.category.clone(),
        tags: n.tags.clone(),
        created_at: n.created().to_rfc3339(),
        updated_at: n.updated().to_rfc3339(),
        words,
        reading_time,
    }
}

pub fn note_to_summary(n: &Note) -> NoteSummary {
    NoteSummary {
        id: n.id.clone(),
        title: n.title.clone(),
        category: n.category.clone(),
        tags: n.tags.clone(),
        updated_at: n.updated().to_rfc3339(),
    }
}
