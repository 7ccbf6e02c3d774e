//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate session, identity and task persistence into view-level
//!   controllers.
//! - Keep UI shells decoupled from storage and provider details.

pub mod auth_flow;
pub mod dashboard;
pub mod task_service;
