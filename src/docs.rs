// src/docs.rs

use utoipa::openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::common::pagination::Paginated;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::me,

        // --- Employees ---
        handlers::employees::create_employee,
        handlers::employees::list_employees,
        handlers::employees::get_employee,
        handlers::employees::update_employee,
        handlers::employees::delete_employee,

        // --- Roles ---
        handlers::rbac::create_role,
        handlers::rbac::list_roles,
        handlers::rbac::delete_role,

        // --- Leads ---
        handlers::leads::create_lead,
        handlers::leads::list_leads,
        handlers::leads::get_lead,
        handlers::leads::delete_lead,
        handlers::leads::update_lead_status,
        handlers::leads::update_lead_disposition,
        handlers::leads::assign_lead,

        // --- Visits ---
        handlers::visits::create_visit,
        handlers::visits::list_visits,
        handlers::visits::update_visit,

        // --- Bookings ---
        handlers::bookings::create_booking,
        handlers::bookings::list_bookings,
        handlers::bookings::get_booking,
        handlers::bookings::delete_booking,

        // --- Properties ---
        handlers::properties::create_property,
        handlers::properties::list_properties,
        handlers::properties::get_property,
        handlers::properties::get_property_by_vsid,
        handlers::properties::update_property,
        handlers::properties::delete_property,
        handlers::properties::add_booster,
        handlers::properties::patch_booster,
        handlers::properties::remove_booster,

        // --- Invoices ---
        handlers::invoices::create_invoice,
        handlers::invoices::list_invoices,
        handlers::invoices::get_invoice,
        handlers::invoices::update_invoice_status,
        handlers::invoices::delete_invoice,

        // --- WhatsApp ---
        handlers::whatsapp::verify_webhook,
        handlers::whatsapp::receive_webhook,
        handlers::whatsapp::list_conversations,
        handlers::whatsapp::list_messages,
        handlers::whatsapp::mark_read,
        handlers::whatsapp::send_message,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
        handlers::dashboard::get_leads_by_status,
        handlers::dashboard::get_leads_by_disposition,
        handlers::dashboard::get_bookings_by_area,

        // --- Realtime ---
        handlers::realtime::realtime_ws,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::LoginPayload,
            models::auth::AuthResponse,
            models::auth::Claims,

            // --- Employees / Roles ---
            models::employee::Employee,
            models::employee::CreateEmployeePayload,
            models::employee::UpdateEmployeePayload,
            models::rbac::Role,
            models::rbac::CreateRolePayload,

            // --- Leads / Visits / Bookings ---
            models::lead::LeadStatus,
            models::lead::Lead,
            models::lead::CreateLeadPayload,
            models::lead::UpdateLeadStatusPayload,
            models::lead::UpdateDispositionPayload,
            models::lead::AssignLeadPayload,
            models::visit::VisitStatus,
            models::visit::Visit,
            models::visit::CreateVisitPayload,
            models::visit::UpdateVisitPayload,
            models::booking::Booking,
            models::booking::CreateBookingPayload,

            // --- Properties ---
            models::property::PropertyStatus,
            models::property::Booster,
            models::property::Property,
            models::property::CreatePropertyPayload,
            models::property::UpdatePropertyPayload,
            models::property::AddBoosterPayload,
            models::property::PatchBoosterPayload,

            // --- Invoices ---
            models::invoice::InvoiceStatus,
            models::invoice::InvoiceLine,
            models::invoice::Invoice,
            models::invoice::CreateInvoicePayload,
            models::invoice::UpdateInvoiceStatusPayload,

            // --- WhatsApp ---
            models::whatsapp::MessageDirection,
            models::whatsapp::Conversation,
            models::whatsapp::ChatMessage,
            models::whatsapp::SendMessagePayload,

            // --- Dashboard ---
            models::dashboard::LeadStatusCount,
            models::dashboard::DispositionCount,
            models::dashboard::AreaBookings,
            models::dashboard::DashboardSummary,

            // --- Páginas ---
            Paginated<models::employee::Employee>,
            Paginated<models::lead::Lead>,
            Paginated<models::booking::Booking>,
            Paginated<models::property::Property>,
            Paginated<models::invoice::Invoice>,
        )
    ),
    tags(
        (name = "Auth", description = "Login por cookie HTTP-only"),
        (name = "Employees", description = "Cadastro de Funcionários (RH)"),
        (name = "Roles", description = "Cargos por departamento e origem"),
        (name = "Leads", description = "Consultas de venda e seu funil"),
        (name = "Visits", description = "Visitas agendadas a propriedades"),
        (name = "Bookings", description = "Reservas fechadas"),
        (name = "Properties", description = "Propriedades e boosters"),
        (name = "Invoices", description = "Faturamento"),
        (name = "WhatsApp", description = "Webhook e caixa de entrada do WhatsApp"),
        (name = "Dashboard", description = "Indicadores Gerenciais"),
        (name = "Realtime", description = "Eventos em tempo real via WebSocket")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "cookie_auth",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("token"))),
        );
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route_group() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/employees/{id}",
            "/api/leads/{id}/status",
            "/api/properties/{id}/boosters/{booster_id}",
            "/api/invoices/{id}/status",
            "/api/whatsapp/webhook",
            "/api/dashboard/summary",
            "/api/realtime/ws",
        ] {
            assert!(doc.paths.paths.contains_key(path), "rota '{}' sem documentação", path);
        }
    }
}
