pub mod app;
pub mod config;
pub mod favorites;
pub mod feeds;
pub mod home;
pub mod models;
pub mod storage;
pub mod tmdb;
pub mod view;
