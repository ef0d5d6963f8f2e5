//! Core library for the `loadgrid` CLI.
//!
//! This crate provides the building blocks of a distributed test-agent
//! harness: even load allocation across agents, per-queue action execution
//! statistics, the load queue lifecycle, and the wire protocol used to
//! dispatch action invocations to remote agents and merge their results.
//! The primary user-facing interface is the `loadgrid` command-line
//! application running an agent process; the executor side is consumed as a
//! library by test drivers.
pub mod action;
pub mod config;
pub mod dispatch;
pub mod entry;
pub mod error;
pub mod logger;
pub mod queue;
pub mod stats;
