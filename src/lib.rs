//! DataLens Demo Library
//!
//! Uploads documents (PDF/JPEG/PNG) to the DataLens OCR service and renders
//! the structured response: every string in the response is HTML-escaped,
//! then projected onto a display schema chosen by customer type and commodity.
//!
//! # Modules
//!
//! - `analysis`: End-to-end analysis workflow.
//! - `config`: Configuration management.
//! - `documents`: Uploaded documents, MIME detection and previews.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Selection, projection and report types.
//! - `ocr_client`: OCR and OAuth client.
//! - `projector`: Key-path resolution and schema projection.
//! - `render`: HTML pages.
//! - `routes`: Router and middleware.
//! - `sanitize`: HTML escaping of response trees.
//! - `schema`: Display schemas and their merge rules.

pub mod analysis;
pub mod config;
pub mod documents;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod ocr_client;
pub mod projector;
pub mod render;
pub mod routes;
pub mod sanitize;
pub mod schema;
