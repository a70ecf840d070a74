pub mod app;
pub mod cache;
pub mod config;
pub mod domain;
pub mod enrich;
pub mod error;
pub mod graph;
pub mod normalize;
pub mod output;
pub mod source;
pub mod spreadsheet;
pub mod store;
pub mod web;
pub mod xref;
