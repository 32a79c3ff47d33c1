//! `shopworks-api` — HTTP surface over the order pricing & lifecycle engine.

pub mod app;
