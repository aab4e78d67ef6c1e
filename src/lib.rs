//! Pagesmith - realtime core of a visual page builder
//!
//! This crate provides the in-process event bus, synthetic realtime traffic,
//! frame-coalesced live preview state and rolling analytics that back the
//! editor's collaborative and live-preview features.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
