pub mod app;
pub mod cli;
pub mod config;
pub mod controller;
pub mod fetcher;
pub mod filters;
pub mod model;
pub mod observer;
pub mod output;
pub mod route;
pub mod session;
pub mod validator;

#[cfg(test)]
mod tests;
