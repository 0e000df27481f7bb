//! # Diet Plan Core
//!
//! Parsing, validation and shopping-list aggregation for diet plans
//! uploaded as spreadsheets. The crate turns free-text ingredient lines
//! into structured, unit-normalized products, cross-validates the trainer's
//! meal-schedule template against the parsed file, suggests shopping
//! categories from historical choices, and drives the validate/preview/save
//! round-trips.

pub mod cache;
pub mod categorization;
pub mod db;
pub mod diet_model;
pub mod excel_parser;
pub mod product_parser;
pub mod quantity_parser;
pub mod units;
pub mod upload;
pub mod validation;
pub mod worker;
