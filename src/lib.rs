pub mod app;
pub mod config;
pub mod domain;
pub mod referral;
pub mod repository;
pub mod routes;
