pub mod cache;
pub mod comment;
pub mod config;
pub mod db;
pub mod error;
pub mod filesystem;
pub mod follow;
pub mod form;
pub mod group;
pub mod image;
pub mod middleware;
pub mod orm;
pub mod pagination;
pub mod post;
pub mod session;
pub mod timeline;
pub mod user;
pub mod web;

pub use session::MainData;
