// API routes and handlers

pub mod admin;
pub mod assignments;
pub mod auth;
pub mod calendar;
pub mod clients;
pub mod exercises;
pub mod health;
pub mod import;
pub mod programs;
pub mod progress;
pub mod routes;
pub mod workouts;

pub use routes::{create_routes, AppState};
