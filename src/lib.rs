// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Video catalog manager for a portfolio site.
//!
//! The portfolio page keeps its video catalog as two literal arrays inside a
//! UI source file. This crate edits those arrays in place (add, delete,
//! reorder, list), and publishes each edit through Git. It can be driven over
//! HTTP with [`server`], or directly from the command line.
//!
//! # See Also
//!
//! 1. [`catalog`]
//! 2. [`store`]
//! 3. [`publish`]
//! 4. [`service`]

pub mod catalog;
pub mod config;
pub mod path;
pub mod publish;
pub mod server;
pub mod service;
pub mod store;
