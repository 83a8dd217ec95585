pub mod booking_repo;
pub use booking_repo::BookingRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
pub mod employee_repo;
pub use employee_repo::EmployeeRepository;
pub mod invoice_repo;
pub use invoice_repo::InvoiceRepository;
pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod property_repo;
pub use property_repo::PropertyRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod visit_repo;
pub use visit_repo::VisitRepository;
pub mod whatsapp_repo;
pub use whatsapp_repo::WhatsAppRepository;

/// Padrão "contém" para ILIKE, com `%`, `_` e `\\` do usuário escapados.
/// Usar junto com `ESCAPE '\\'`.
pub fn contains_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(contains_pattern(" villa "), "%villa%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern("c:\\x"), "%c:\\\\x%");
    }
}
