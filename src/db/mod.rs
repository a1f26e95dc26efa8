pub mod constraint;
pub mod entities;
pub mod migration;
pub mod models;
pub mod services;
