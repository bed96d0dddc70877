pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod render;
pub mod repositories;
pub mod services;
pub mod store;
pub mod utils;

pub use config::Settings;
pub use db::DbClient;
pub use services::{BranchManager, HierarchyService, build_hierarchy};
pub use store::Stores;
