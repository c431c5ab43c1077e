//! # Shelf Scanner
//!
//! Photograph a bookshelf, identify the books on it, and get a short list of
//! recommendations by category affinity.
//!
//! Text recognition and book metadata come from external providers (Google
//! Cloud Vision and Google Books); scanned books and user bookmarks are kept
//! in SQLite. The only local decision-making is the recommender, which picks
//! the dominant category among the scanned books.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌──────────┐   ┌─────────┐   ┌───────────┐
//! │  image   │──▶│   OCR   │──▶│  titles  │──▶│ catalog │──▶│  SQLite   │
//! └──────────┘   └─────────┘   └──────────┘   └─────────┘   └─────┬─────┘
//!                                                                 ▼
//!                                                          ┌─────────────┐
//!                                                          │ recommender │
//!                                                          └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! shelf init                      # create database
//! shelf scan ./shelf.jpg          # scan a photo from the command line
//! shelf serve                     # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`ocr`] | Text recognition providers |
//! | [`catalog`] | Book metadata providers |
//! | [`titles`] | OCR text to candidate titles |
//! | [`recommend`] | Category-affinity recommendations |
//! | [`scan`] | Scan pipeline |
//! | [`store`] | Book and bookmark storage |
//! | [`session`] | Anonymous session registry |
//! | [`server`] | HTTP API server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod bookmarks;
pub mod books;
pub mod catalog;
pub mod config;
pub mod db;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod ocr;
pub mod providers;
pub mod recommend;
pub mod scan;
pub mod scan_cmd;
pub mod server;
pub mod services;
pub mod session;
pub mod store;
pub mod titles;
