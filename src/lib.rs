pub mod api;
pub mod app;
pub mod catalog;
pub mod config;
pub mod converters;
pub mod fetch_error;
pub mod geojson;
pub mod geometry;
pub mod merge;
pub mod services;
pub mod sheet_fetcher;
pub mod store;
pub mod table;
