// Pipeline configuration
pub mod config;

// External model boundary
pub mod generator;

// JSON extraction from model output
pub mod extract;

// .docx container reading
pub mod docx;

// Extraction record append log
pub mod artifact;

// Generated project directory management
pub mod workspace;

// Project zip archival
pub mod archive;

// Generation pipeline (stages + orchestration)
pub mod pipeline;

// HTTP upload boundary
pub mod server;
