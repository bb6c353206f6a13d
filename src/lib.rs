//! casedesk: case-management backend for a legal practice.
//!
//! Firms, lawyers and client companies; cases with their events, notes,
//! tasks and document references; and the server-rendered pages the office
//! works from.

pub mod casework;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod settings;
pub mod web;

#[cfg(test)]
mod testing;
