pub mod auth;
pub mod bookings;
pub mod dashboard;
pub mod employees;
pub mod invoices;
pub mod leads;
pub mod properties;
pub mod rbac;
pub mod realtime;
pub mod visits;
pub mod whatsapp;
