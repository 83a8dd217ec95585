// src/services/property_service.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::{PageRequest, Paginated}},
    db::{property_repo::NewProperty, PropertyRepository},
    models::property::{
        AddBoosterPayload, Booster, CreatePropertyPayload, Property, PropertyFilter, UpdatePropertyPayload,
        PATCHABLE_BOOSTER_FIELDS,
    },
};

fn parse_field<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(|_| AppError::BadRequest("booster.invalid_value".into()))
}

fn check_period(starts_at: DateTime<Utc>, ends_at: Option<DateTime<Utc>>) -> Result<(), AppError> {
    if ends_at.is_some_and(|end| end < starts_at) {
        return Err(AppError::BadRequest("booster.invalid_period".into()));
    }
    Ok(())
}

/// Altera um único campo do booster `id`, localizado por varredura linear.
/// Os demais boosters, e os demais campos deste, ficam intocados.
pub fn patch_booster_field(
    boosters: &mut [Booster],
    id: Uuid,
    field: &str,
    value: Value,
) -> Result<Booster, AppError> {
    if !PATCHABLE_BOOSTER_FIELDS.contains(&field) {
        return Err(AppError::BadRequest("booster.field_not_patchable".into()));
    }

    let booster = boosters
        .iter_mut()
        .find(|b| b.id == id)
        .ok_or(AppError::NotFound("resource.booster"))?;

    // Aplica numa cópia: um valor inválido não deixa o booster pela metade
    let mut patched = booster.clone();
    match field {
        "label" => {
            let label: String = parse_field(value)?;
            if label.trim().is_empty() {
                return Err(AppError::BadRequest("booster.invalid_value".into()));
            }
            patched.label = label.trim().to_string();
        }
        "amount" => {
            let amount: Decimal = parse_field(value)?;
            if amount < Decimal::ZERO {
                return Err(AppError::BadRequest("booster.invalid_value".into()));
            }
            patched.amount = amount;
        }
        "startsAt" => patched.starts_at = parse_field(value)?,
        "endsAt" => patched.ends_at = parse_field(value)?,
        "active" => patched.active = parse_field(value)?,
        _ => return Err(AppError::BadRequest("booster.field_not_patchable".into())),
    }
    check_period(patched.starts_at, patched.ends_at)?;

    *booster = patched.clone();
    Ok(patched)
}

#[derive(Clone)]
pub struct PropertyService {
    repo: PropertyRepository,
    pool: PgPool,
}

impl PropertyService {
    pub fn new(repo: PropertyRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn create(&self, payload: &CreatePropertyPayload) -> Result<Property, AppError> {
        let area = payload.area.trim().to_lowercase();
        let property_type = payload.property_type.trim().to_lowercase();

        let property = self
            .repo
            .create(NewProperty {
                name: payload.name.trim(),
                property_type: &property_type,
                area: &area,
                address: payload.address.as_deref(),
                price: payload.price,
                bedrooms: payload.bedrooms,
                amenities: &payload.amenities,
            })
            .await?;

        tracing::info!("🏘️ Propriedade {} cadastrada em '{}'", property.vsid, property.area);
        Ok(property)
    }

    pub async fn list(&self, filter: &PropertyFilter) -> Result<Paginated<Property>, AppError> {
        let page = PageRequest::new(filter.page, filter.limit);
        let (data, total) = self.repo.list(filter, page).await?;
        Ok(Paginated::new(data, page, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<Property, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("resource.property"))
    }

    pub async fn get_by_vsid(&self, vsid: &str) -> Result<Property, AppError> {
        self.repo
            .find_by_vsid(vsid.trim())
            .await?
            .ok_or(AppError::NotFound("resource.property"))
    }

    pub async fn update(&self, id: Uuid, mut changes: UpdatePropertyPayload) -> Result<Property, AppError> {
        changes.area = changes.area.map(|a| a.trim().to_lowercase());
        changes.property_type = changes.property_type.map(|t| t.trim().to_lowercase());

        self.repo
            .update(id, &changes)
            .await?
            .ok_or(AppError::NotFound("resource.property"))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("resource.property"));
        }
        Ok(())
    }

    // --- Boosters: ler, alterar e gravar o array com a linha travada ---

    pub async fn add_booster(&self, property_id: Uuid, payload: &AddBoosterPayload) -> Result<Property, AppError> {
        let starts_at = payload.starts_at.unwrap_or_else(Utc::now);
        check_period(starts_at, payload.ends_at)?;
        if payload.amount < Decimal::ZERO {
            return Err(AppError::BadRequest("booster.invalid_value".into()));
        }

        let mut tx = self.pool.begin().await?;
        let property = self
            .repo
            .find_for_update(&mut *tx, property_id)
            .await?
            .ok_or(AppError::NotFound("resource.property"))?;

        let mut boosters = property.boosters.0;
        boosters.push(Booster {
            id: Uuid::new_v4(),
            label: payload.label.trim().to_string(),
            amount: payload.amount,
            starts_at,
            ends_at: payload.ends_at,
            active: true,
        });

        let updated = self.repo.save_boosters(&mut *tx, property_id, &boosters).await?;
        tx.commit().await?;
        Ok(updated)
    }

    pub async fn remove_booster(&self, property_id: Uuid, booster_id: Uuid) -> Result<Property, AppError> {
        let mut tx = self.pool.begin().await?;
        let property = self
            .repo
            .find_for_update(&mut *tx, property_id)
            .await?
            .ok_or(AppError::NotFound("resource.property"))?;

        let mut boosters = property.boosters.0;
        let before = boosters.len();
        boosters.retain(|b| b.id != booster_id);
        if boosters.len() == before {
            return Err(AppError::NotFound("resource.booster"));
        }

        let updated = self.repo.save_boosters(&mut *tx, property_id, &boosters).await?;
        tx.commit().await?;
        Ok(updated)
    }

    pub async fn patch_booster(
        &self,
        property_id: Uuid,
        booster_id: Uuid,
        field: &str,
        value: Value,
    ) -> Result<Property, AppError> {
        let mut tx = self.pool.begin().await?;
        let property = self
            .repo
            .find_for_update(&mut *tx, property_id)
            .await?
            .ok_or(AppError::NotFound("resource.property"))?;

        let mut boosters = property.boosters.0;
        patch_booster_field(&mut boosters, booster_id, field, value)?;

        let updated = self.repo.save_boosters(&mut *tx, property_id, &boosters).await?;
        tx.commit().await?;

        tracing::debug!("Booster {} da propriedade {}: campo '{}' alterado", booster_id, updated.vsid, field);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn booster(label: &str) -> Booster {
        Booster {
            id: Uuid::new_v4(),
            label: label.into(),
            amount: Decimal::new(4990, 2),
            starts_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            ends_at: None,
            active: true,
        }
    }

    #[test]
    fn changes_only_the_matching_entry_and_field() {
        let mut boosters = vec![booster("Homepage"), booster("Newsletter"), booster("Banner")];
        let original = boosters.clone();
        let target = boosters[1].id;

        let patched = patch_booster_field(&mut boosters, target, "active", json!(false)).unwrap();

        assert!(!patched.active);
        assert_eq!(boosters[0], original[0]);
        assert_eq!(boosters[2], original[2]);
        assert_eq!(
            boosters[1],
            Booster { active: false, ..original[1].clone() }
        );
    }

    #[test]
    fn patches_typed_fields() {
        let mut boosters = vec![booster("Homepage")];
        let id = boosters[0].id;

        patch_booster_field(&mut boosters, id, "amount", json!(99.5)).unwrap();
        assert_eq!(boosters[0].amount, Decimal::new(995, 1));

        patch_booster_field(&mut boosters, id, "endsAt", json!("2025-02-01T00:00:00Z")).unwrap();
        assert_eq!(boosters[0].ends_at, Some(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()));

        patch_booster_field(&mut boosters, id, "label", json!("  Topo  ")).unwrap();
        assert_eq!(boosters[0].label, "Topo");
    }

    #[test]
    fn rejects_unknown_booster_and_disallowed_field() {
        let mut boosters = vec![booster("Homepage")];
        let id = boosters[0].id;

        let err = patch_booster_field(&mut boosters, Uuid::new_v4(), "label", json!("x")).unwrap_err();
        assert!(matches!(err, AppError::NotFound("resource.booster")));

        let err = patch_booster_field(&mut boosters, id, "id", json!(Uuid::new_v4())).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(key) if key == "booster.field_not_patchable"));
    }

    #[test]
    fn invalid_values_leave_the_booster_untouched() {
        let mut boosters = vec![booster("Homepage")];
        let original = boosters.clone();
        let id = boosters[0].id;

        assert!(patch_booster_field(&mut boosters, id, "active", json!("sim")).is_err());
        assert!(patch_booster_field(&mut boosters, id, "amount", json!(-1)).is_err());
        // Fim antes do início
        assert!(patch_booster_field(&mut boosters, id, "endsAt", json!("2024-12-01T00:00:00Z")).is_err());

        assert_eq!(boosters, original);
    }
}
