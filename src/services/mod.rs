pub mod analysis;
pub mod director;
pub mod export;
pub mod format_catalog;
pub mod format_matcher;
pub mod llm;
pub mod media_tools;
pub mod suggestion_store;
pub mod trends;
pub mod upload_assembler;
