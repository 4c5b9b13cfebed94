pub mod app;
pub mod auth;
pub mod db;
pub mod handlers;
pub mod helpers;
pub mod models;
pub mod routes;
