pub mod client;

pub use client::{
    FetchResponse, McpClient, McpCollaborator, McpError, ScrapeResponse, SearchResponse,
    search_stored_data,
};
