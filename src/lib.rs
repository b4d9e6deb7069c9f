//! Team activity collectors.
//!
//! Four collectors pull recent activity from the services a team actually
//! lives in (Gmail meeting notes, Google Docs, Jira, Slack) and normalize it
//! into one uniform JSON record per source, ready for downstream digest
//! tooling. The shared pieces live in [`models`], [`runner`], and [`traits`];
//! each `collector_*` module owns exactly one upstream API.

pub mod collector_chat;
pub mod collector_docs;
pub mod collector_issues;
pub mod collector_mail;
pub mod credentials;
pub mod http;
pub mod logging;
pub mod models;
pub mod query;
pub mod runner;
pub mod traits;
