mod helpers;

mod auth;
mod orders;
mod payments;
mod webhook;
