//! # Coffee server
//! This crate hosts the HTTP server for the coffee ordering service. It is responsible for:
//! * Authenticating customers and administrators, and issuing access tokens.
//! * Exposing the catalog, order and payment APIs of the coffee engine over JSON.
//! * Receiving payment notifications from Paystack and settling the payments they report.
//! * Expiring orders that were never paid for.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! Public:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /login` and `POST /users` (signup).
//!
//! Authenticated (`Authorization: Bearer <token>`): catalog reads, placing, viewing, cancelling and paying for orders.
//! Admin only: catalog writes, user management and order status updates.
//!
//! Webhook: `POST /webhook/paystack`, behind an IP whitelist and HMAC signature checks.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
