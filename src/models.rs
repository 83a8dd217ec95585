pub mod auth;
pub mod booking;
pub mod dashboard;
pub mod employee;
pub mod invoice;
pub mod lead;
pub mod property;
pub mod rbac;
pub mod visit;
pub mod whatsapp;
