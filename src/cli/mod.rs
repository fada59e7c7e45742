mod commands;
mod handlers;

pub use commands::{Cli, Commands, ExportFormat};
pub use handlers::{
    handle_add, handle_attach, handle_backlinks, handle_categories, handle_context, handle_delete,
    handle_export, handle_get, handle_import, handle_init, handle_list, handle_refs,
    handle_render, handle_resolve, handle_search, handle_serve, handle_stats, handle_update,
};
