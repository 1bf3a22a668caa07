pub mod chat;
pub mod deployments;
pub mod health;
pub mod logs;
pub mod projects;
