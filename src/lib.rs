//! Care Intake - Conversational Clinical Assessment Engine
//!
//! This crate runs structured intake conversations: each user turn is mined
//! for clinical facts, answered with retrieval-grounded model replies, and
//! scored against the strategy's eligibility criteria.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
