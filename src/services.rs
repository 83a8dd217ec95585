pub mod auth;
pub mod booking_service;
pub mod dashboard_service;
pub mod employee_service;
pub mod invoice_service;
pub mod lead_service;
pub mod property_service;
pub mod rbac_service;
pub mod visit_service;
pub mod whatsapp_service;
