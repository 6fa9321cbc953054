pub mod api;
pub mod collection;
pub mod config;
pub mod error;
pub mod gamedata;
pub mod ingest;
pub mod llms_txt;
pub mod metrics;
pub mod pvp;
pub mod record;
pub mod search;
