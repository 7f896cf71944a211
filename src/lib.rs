//! Coaching backend: trainers build exercises, workouts and multi-day
//! programs, schedule them onto client calendars, and clients track the
//! sessions they were given.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use error::{AppError, AppResult};
