use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Longest category code accepted for an inventory name
pub const MAX_NAME_LENGTH: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Inventory {
    #[serde(rename = "_id")]
    pub id: String,
    /// Category code such as `C1`
    pub name: String,
    pub date: InventoryDates,
    pub quantity: InventoryQuantity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryDates {
    pub received_date: DateTime<Utc>,
    pub dispatched_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InventoryQuantity {
    pub received_quantity: u64,
    #[serde(default)]
    pub dispatched_quantity: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InventoryStatus {
    Pending,
    Delivered,
}

impl Inventory {
    /// Creates a freshly received record with nothing dispatched yet
    pub fn new(name: String, received_date: DateTime<Utc>, received_quantity: u64) -> Self {
        Inventory {
            id: Uuid::new_v4().to_string(),
            name,
            date: InventoryDates {
                received_date,
                dispatched_date: None,
            },
            quantity: InventoryQuantity {
                received_quantity,
                dispatched_quantity: 0,
            },
        }
    }

    pub fn pending_quantity(&self) -> u64 {
        self.quantity
            .received_quantity
            .saturating_sub(self.quantity.dispatched_quantity)
    }

    /// Delivered once a dispatch date is recorded and nothing is left pending
    pub fn status(&self) -> InventoryStatus {
        if self.date.dispatched_date.is_some() && self.pending_quantity() == 0 {
            InventoryStatus::Delivered
        } else {
            InventoryStatus::Pending
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name is required".to_string());
        }

        if self.name.chars().count() > MAX_NAME_LENGTH {
            return Err(format!("Name cannot exceed {} characters", MAX_NAME_LENGTH));
        }

        if self.quantity.dispatched_quantity > self.quantity.received_quantity {
            return Err(format!(
                "Dispatched quantity ({}) cannot exceed received quantity ({})",
                self.quantity.dispatched_quantity, self.quantity.received_quantity
            ));
        }

        Ok(())
    }

    /// Returns a copy with the changes applied, or the reason they were rejected.
    /// `self` is left untouched either way.
    pub fn with_changes(&self, changes: &InventoryChanges) -> Result<Inventory, String> {
        let mut updated = self.clone();

        if let Some(name) = &changes.name {
            updated.name = name.clone();
        }
        if let Some(received_date) = changes.received_date {
            updated.date.received_date = received_date;
        }
        if let Some(dispatched_date) = changes.dispatched_date {
            updated.date.dispatched_date = Some(dispatched_date);
        }
        if let Some(received_quantity) = changes.received_quantity {
            updated.quantity.received_quantity = received_quantity;
        }
        if let Some(dispatched_quantity) = changes.dispatched_quantity {
            updated.quantity.dispatched_quantity = dispatched_quantity;
        }

        updated.validate()?;
        Ok(updated)
    }

    /// Text a client encodes into the record's QR code
    pub fn qr_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Inventory as sent to clients, with the derived fields filled in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryView {
    #[serde(flatten)]
    pub inventory: Inventory,
    pub pending_quantity: u64,
    pub status: InventoryStatus,
}

impl From<Inventory> for InventoryView {
    fn from(inventory: Inventory) -> Self {
        InventoryView {
            pending_quantity: inventory.pending_quantity(),
            status: inventory.status(),
            inventory,
        }
    }
}

/// Validated set of field changes for an existing record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryChanges {
    pub name: Option<String>,
    pub received_date: Option<DateTime<Utc>>,
    pub dispatched_date: Option<DateTime<Utc>>,
    pub received_quantity: Option<u64>,
    pub dispatched_quantity: Option<u64>,
}

impl InventoryChanges {
    pub fn is_empty(&self) -> bool {
        *self == InventoryChanges::default()
    }
}

/// Body of `POST /api/inventory`. Only these fields are read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateInventoryRequest {
    pub name: Option<String>,
    pub date: Option<Value>,
    pub quantity: Option<Value>,
}

impl CreateInventoryRequest {
    pub fn into_inventory(self) -> Result<Inventory, String> {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| "Name is required".to_string())?;

        let received_date = optional_date(self.date.as_ref(), "date")?
            .ok_or_else(|| "Date is required".to_string())?;

        let received_quantity = optional_quantity(self.quantity.as_ref(), "quantity")?
            .ok_or_else(|| "Quantity is required".to_string())?;

        let inventory = Inventory::new(name, received_date, received_quantity);
        inventory.validate()?;
        Ok(inventory)
    }
}

/// Body of `PUT /api/inventory/:id`. Absent, null and empty-string fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateInventoryRequest {
    pub name: Option<String>,
    pub date: Option<Value>,
    pub dispatched_date: Option<Value>,
    pub quantity: Option<Value>,
    pub dispatched_quantity: Option<Value>,
}

impl UpdateInventoryRequest {
    pub fn into_changes(self) -> Result<InventoryChanges, String> {
        Ok(InventoryChanges {
            name: self.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            received_date: optional_date(self.date.as_ref(), "date")?,
            dispatched_date: optional_date(self.dispatched_date.as_ref(), "dispatched_date")?,
            received_quantity: optional_quantity(self.quantity.as_ref(), "quantity")?,
            dispatched_quantity: optional_quantity(
                self.dispatched_quantity.as_ref(),
                "dispatched_quantity",
            )?,
        })
    }
}

/// Decoded QR payload posted by a scanner.
///
/// The payload is the full record JSON; only the id and the optional
/// dispatch overrides are read.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchRequest {
    #[serde(rename = "_id", alias = "id")]
    pub id: Option<String>,
    pub dispatched_date: Option<Value>,
    pub dispatched_quantity: Option<Value>,
}

impl DispatchRequest {
    /// Dispatches everything received at `now` unless the scan says otherwise
    pub fn into_changes(
        self,
        record: &Inventory,
        now: DateTime<Utc>,
    ) -> Result<InventoryChanges, String> {
        let dispatched_date =
            optional_date(self.dispatched_date.as_ref(), "dispatched_date")?.unwrap_or(now);
        let dispatched_quantity =
            optional_quantity(self.dispatched_quantity.as_ref(), "dispatched_quantity")?
                .unwrap_or(record.quantity.received_quantity);

        Ok(InventoryChanges {
            dispatched_date: Some(dispatched_date),
            dispatched_quantity: Some(dispatched_quantity),
            ..InventoryChanges::default()
        })
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Accepts RFC 3339 timestamps, `YYYY-MM-DD` dates (midnight UTC) or epoch milliseconds
pub fn parse_date(value: &Value, field: &str) -> Result<DateTime<Utc>, String> {
    let invalid = || format!("Invalid {}: expected an ISO 8601 date", field);

    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
                return Ok(parsed.with_timezone(&Utc));
            }
            let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| invalid())?;
            let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
            Ok(Utc.from_utc_datetime(&midnight))
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Accepts non-negative integers, either as JSON numbers or numeric strings
pub fn parse_quantity(value: &Value, field: &str) -> Result<u64, String> {
    let invalid = || format!("Invalid {}: expected a non-negative whole number", field);

    match value {
        Value::Number(n) => n.as_u64().ok_or_else(invalid),
        Value::String(s) => s.trim().parse::<u64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn optional_date(value: Option<&Value>, field: &str) -> Result<Option<DateTime<Utc>>, String> {
    match value {
        Some(v) if !is_blank(v) => parse_date(v, field).map(Some),
        _ => Ok(None),
    }
}

fn optional_quantity(value: Option<&Value>, field: &str) -> Result<Option<u64>, String> {
    match value {
        Some(v) if !is_blank(v) => parse_quantity(v, field).map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Inventory {
        Inventory::new(
            "C1".to_string(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            10,
        )
    }

    #[test]
    fn test_new_inventory_is_pending() {
        let inventory = sample();
        assert_eq!(inventory.pending_quantity(), 10);
        assert_eq!(inventory.status(), InventoryStatus::Pending);
        assert!(inventory.date.dispatched_date.is_none());
        assert_eq!(inventory.quantity.dispatched_quantity, 0);
    }

    #[test]
    fn test_status_requires_dispatch_date_and_zero_pending() {
        let mut inventory = sample();

        // Fully dispatched by quantity but no date yet
        inventory.quantity.dispatched_quantity = 10;
        assert_eq!(inventory.status(), InventoryStatus::Pending);

        inventory.date.dispatched_date = Some(Utc::now());
        assert_eq!(inventory.status(), InventoryStatus::Delivered);

        // Partial dispatch
        inventory.quantity.dispatched_quantity = 4;
        assert_eq!(inventory.pending_quantity(), 6);
        assert_eq!(inventory.status(), InventoryStatus::Pending);
    }

    #[test]
    fn test_view_serialization() {
        let view = InventoryView::from(sample());
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["name"], "C1");
        assert_eq!(json["quantity"]["received_quantity"], 10);
        assert_eq!(json["quantity"]["dispatched_quantity"], 0);
        assert_eq!(json["date"]["dispatched_date"], Value::Null);
        assert_eq!(json["pending_quantity"], 10);
        assert_eq!(json["status"], "Pending");
        assert!(json["_id"].is_string());
    }

    #[test]
    fn test_create_request_accepts_form_values() {
        let request: CreateInventoryRequest = serde_json::from_value(json!({
            "name": "C3",
            "date": "2024-05-17",
            "quantity": "25",
            "status": "Delivered",
            "_id": "forged"
        }))
        .unwrap();

        let inventory = request.into_inventory().unwrap();
        assert_eq!(inventory.name, "C3");
        assert_eq!(inventory.quantity.received_quantity, 25);
        assert_eq!(
            inventory.date.received_date,
            Utc.with_ymd_and_hms(2024, 5, 17, 0, 0, 0).unwrap()
        );
        assert_ne!(inventory.id, "forged");
    }

    #[test]
    fn test_create_request_rejects_missing_or_bad_fields() {
        let missing_name = CreateInventoryRequest {
            name: None,
            date: Some(json!("2024-05-17")),
            quantity: Some(json!(5)),
        };
        assert!(missing_name.into_inventory().is_err());

        let negative = CreateInventoryRequest {
            name: Some("C1".to_string()),
            date: Some(json!("2024-05-17")),
            quantity: Some(json!(-5)),
        };
        assert!(negative.into_inventory().unwrap_err().contains("quantity"));

        let bad_date = CreateInventoryRequest {
            name: Some("C1".to_string()),
            date: Some(json!("yesterday")),
            quantity: Some(json!(5)),
        };
        assert!(bad_date.into_inventory().unwrap_err().contains("date"));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_date(&json!("2024-01-02T03:04:05Z"), "date").unwrap(), expected);
        assert_eq!(parse_date(&json!("2024-01-02T04:04:05+01:00"), "date").unwrap(), expected);
        assert_eq!(
            parse_date(&json!(expected.timestamp_millis()), "date").unwrap(),
            expected
        );
        assert!(parse_date(&json!(true), "date").is_err());
    }

    #[test]
    fn test_update_ignores_blank_fields() {
        let request: UpdateInventoryRequest = serde_json::from_value(json!({
            "name": "",
            "date": null,
            "dispatched_date": "",
            "dispatched_quantity": 3
        }))
        .unwrap();

        let changes = request.into_changes().unwrap();
        assert_eq!(
            changes,
            InventoryChanges {
                dispatched_quantity: Some(3),
                ..InventoryChanges::default()
            }
        );
    }

    #[test]
    fn test_with_changes_rejects_over_dispatch() {
        let inventory = sample();
        let changes = InventoryChanges {
            dispatched_quantity: Some(11),
            ..InventoryChanges::default()
        };

        let err = inventory.with_changes(&changes).unwrap_err();
        assert!(err.contains("cannot exceed"));
        assert_eq!(inventory.quantity.dispatched_quantity, 0);
    }

    #[test]
    fn test_dispatch_defaults_to_full_quantity() {
        let inventory = sample();
        let now = Utc::now();
        let request: DispatchRequest =
            serde_json::from_str(&inventory.qr_payload().unwrap()).unwrap();
        assert_eq!(request.id.as_deref(), Some(inventory.id.as_str()));

        let changes = request.into_changes(&inventory, now).unwrap();
        let dispatched = inventory.with_changes(&changes).unwrap();

        assert_eq!(dispatched.date.dispatched_date, Some(now));
        assert_eq!(dispatched.quantity.dispatched_quantity, 10);
        assert_eq!(dispatched.status(), InventoryStatus::Delivered);
    }
}
