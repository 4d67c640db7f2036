//! Library exports for the flat-file storefront
//!
//! This module exposes internal components for testing and potential library usage.

pub mod analytics;
pub mod codec;
pub mod config;
pub mod coordinator;
pub mod database;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod notifier;
pub mod repository;
pub mod route;
pub mod storage;
