//! Display schemas for OCR responses.
//!
//! A schema is an ordered list of logical field keys with the label shown next
//! to each value. The order is the curated presentation order. The built-in
//! tables are constants; per-request schemas are always fresh copies, so a
//! merge never leaks fields into a later selection.

use serde::Serialize;

use crate::models::{Commodity, CustomerType, DocumentCategory, Selection};

/// A single display field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Logical key, possibly a dotted key-path.
    pub key: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

impl FieldSpec {
    pub const fn new(key: &'static str, label: &'static str, icon: &'static str) -> Self {
        Self { key, label, icon }
    }

    /// The label to show, falling back to a prettified key when empty.
    pub fn display_label(&self) -> String {
        if !self.label.trim().is_empty() {
            return self.label.to_string();
        }
        prettify_key(self.key)
    }

    pub fn icon(&self) -> Option<&'static str> {
        (!self.icon.is_empty()).then_some(self.icon)
    }
}

/// `"gas_total_annual_consumption"` -> `"Gas total annual consumption"`.
fn prettify_key(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Ordered mapping from logical key to display field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldSchema {
    fields: Vec<FieldSpec>,
}

impl FieldSchema {
    /// Builds a schema, keeping only the first occurrence of each key.
    pub fn new(fields: &[FieldSpec]) -> Self {
        FieldSchema::default().merged_with(fields)
    }

    /// Builds an icon-less schema from `(key, label)` pairs.
    pub fn from_pairs(pairs: &[(&'static str, &'static str)]) -> Self {
        let fields: Vec<FieldSpec> = pairs
            .iter()
            .map(|(key, label)| FieldSpec::new(*key, *label, ""))
            .collect();
        Self::new(&fields)
    }

    /// Returns a new schema with `extra` appended after the current fields.
    ///
    /// Keys already present win; duplicates in `extra` are dropped. `self`
    /// is left untouched.
    pub fn merged_with(&self, extra: &[FieldSpec]) -> Self {
        let mut fields = self.fields.clone();
        for field in extra {
            if fields.iter().any(|f| f.key == field.key) {
                tracing::debug!("Schema merge: keeping earlier definition of '{}'", field.key);
                continue;
            }
            fields.push(*field);
        }
        Self { fields }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.key == key)
    }

    pub fn get(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ============ Built-in tables ============

pub const RESIDENTIAL_COMMON_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", "Name", "👤"),
    FieldSpec::new("surname", "Surname", "👥"),
    FieldSpec::new("odonym_meter_address", "Address (odonym)", "🏠"),
    FieldSpec::new("number_meter_address", "Address (street number)", "🏠"),
    FieldSpec::new("cap_meter_address", "Postal Code", "📮"),
    FieldSpec::new("city_meter_address", "City", "🏙️"),
    FieldSpec::new("province_meter_address", "Province", "⛰️"),
    FieldSpec::new("fiscal_code", "Fiscal Code", "🕵️‍♀️"),
    FieldSpec::new("commodity", "Commodity Type", "🔌"),
    FieldSpec::new("start_of_delivery", "Start of Delivery", "🚀"),
];

pub const RESIDENTIAL_GAS_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("pdr", "PDR", "📌"),
    FieldSpec::new("use_type", "Gas usage type", "🪔"),
    FieldSpec::new("gas_total_annual_consumption", "Total annual gas consumption", "🔥"),
];

pub const RESIDENTIAL_POWER_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("pod", "POD", "📍"),
    FieldSpec::new("engaged_power", "Engaged power", "🔌"),
    FieldSpec::new("power_total_annual_consumption", "Total annual power consumption", "💡"),
    FieldSpec::new("power_F1_annual_consumption", "Power F1 annual consumption", "☀️"),
    FieldSpec::new("power_F2_annual_consumption", "Power F2 annual consumption", "⛅"),
    FieldSpec::new("power_F3_annual_consumption", "Power F3 annual consumption", "🌑"),
];

pub const MICROBUSINESS_COMMON_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("company_name", "Company Name", "🏢"),
    FieldSpec::new("odonym_meter_address", "Meter Address (odonym)", "🏠"),
    FieldSpec::new("number_meter_address", "Meter Address (street number)", "🏠"),
    FieldSpec::new("cap_meter_address", "Meter Postal Code", "📮"),
    FieldSpec::new("city_meter_address", "Meter City", "🏙️"),
    FieldSpec::new("province_meter_address", "Meter Province", "⛰️"),
    FieldSpec::new("odonym_legal_address", "Legal Address (odonym)", "🏦"),
    FieldSpec::new("number_legal_address", "Legal Address (street number)", "🏦"),
    FieldSpec::new("cap_legal_address", "Legal Postal Code", "📫"),
    FieldSpec::new("city_legal_address", "Legal City", "🏙️"),
    FieldSpec::new("province_legal_address", "Legal Province", "⛰️"),
    FieldSpec::new("fiscal_code", "Fiscal Code", "🕵️‍♀️"),
    FieldSpec::new("commodity", "Commodity Type", "🔌"),
];

pub const MICROBUSINESS_GAS_FIELDS: &[FieldSpec] = RESIDENTIAL_GAS_FIELDS;

pub const MICROBUSINESS_POWER_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("pod", "POD", "📍"),
    FieldSpec::new("engaged_power", "Engaged power", "🔌"),
    FieldSpec::new("available_power", "Available power", "⚡"),
    FieldSpec::new("supply_voltage", "Supply voltage", "⚡"),
    FieldSpec::new("power_total_annual_consumption", "Total annual power consumption", "💡"),
    FieldSpec::new("power_F1_annual_consumption", "Power F1 annual consumption", "☀️"),
    FieldSpec::new("power_F2_annual_consumption", "Power F2 annual consumption", "⛅"),
    FieldSpec::new("power_F3_annual_consumption", "Power F3 annual consumption", "🌑"),
];

pub const IDENTITY_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("campi_documento.nome", "Name", "👤"),
    FieldSpec::new("campi_documento.cognome", "Surname", "👥"),
    FieldSpec::new("campi_documento.id_documento", "ID", "ℹ️"),
    FieldSpec::new("campi_documento.data_scadenza", "Expiration date", "📆"),
    FieldSpec::new("tipo_documento", "Type of document", "📑"),
    FieldSpec::new("dati_validi", "Document validity", "✅"),
];

/// Subtree of an invoice response that holds the extracted fields.
pub const INVOICE_RESPONSE_ROOT: &str = "extracted_fields";

/// The three tables that make up one customer type's invoice schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerSchemas {
    pub common: FieldSchema,
    pub gas: FieldSchema,
    pub power: FieldSchema,
}

impl CustomerSchemas {
    pub fn new(common: &[FieldSpec], gas: &[FieldSpec], power: &[FieldSpec]) -> Self {
        Self {
            common: FieldSchema::new(common),
            gas: FieldSchema::new(gas),
            power: FieldSchema::new(power),
        }
    }

    /// Common fields, then gas, then power, first definition winning.
    pub fn merge_for(&self, commodity: Commodity) -> FieldSchema {
        let mut schema = self.common.clone();
        if commodity.includes_gas() {
            schema = schema.merged_with(&self.gas.fields);
        }
        if commodity.includes_power() {
            schema = schema.merged_with(&self.power.fields);
        }
        schema
    }
}

/// Immutable set of display schemas, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRegistry {
    identity: FieldSchema,
    residential: CustomerSchemas,
    microbusiness: CustomerSchemas,
}

impl SchemaRegistry {
    pub fn new(
        identity: FieldSchema,
        residential: CustomerSchemas,
        microbusiness: CustomerSchemas,
    ) -> Self {
        Self {
            identity,
            residential,
            microbusiness,
        }
    }

    /// Registry with the built-in field tables.
    pub fn builtin() -> Self {
        Self::new(
            FieldSchema::new(IDENTITY_FIELDS),
            CustomerSchemas::new(
                RESIDENTIAL_COMMON_FIELDS,
                RESIDENTIAL_GAS_FIELDS,
                RESIDENTIAL_POWER_FIELDS,
            ),
            CustomerSchemas::new(
                MICROBUSINESS_COMMON_FIELDS,
                MICROBUSINESS_GAS_FIELDS,
                MICROBUSINESS_POWER_FIELDS,
            ),
        )
    }

    pub fn identity_schema(&self) -> &FieldSchema {
        &self.identity
    }

    /// Fresh merged invoice schema for a customer type and commodity.
    pub fn invoice_schema(&self, customer_type: CustomerType, commodity: Commodity) -> FieldSchema {
        let tables = match customer_type {
            CustomerType::Residential => &self.residential,
            CustomerType::Microbusiness => &self.microbusiness,
        };
        tables.merge_for(commodity)
    }

    /// Schema and response root to use for a selection.
    pub fn plan_for(&self, selection: &Selection) -> (FieldSchema, Option<&'static str>) {
        match selection.category {
            DocumentCategory::Identity => (self.identity.clone(), None),
            DocumentCategory::Invoice => (
                self.invoice_schema(selection.customer_type, selection.commodity),
                Some(INVOICE_RESPONSE_ROOT),
            ),
        }
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_schema_is_common_then_gas() {
        let registry = SchemaRegistry::builtin();
        let schema = registry.invoice_schema(CustomerType::Residential, Commodity::Gas);

        assert_eq!(
            schema.len(),
            RESIDENTIAL_COMMON_FIELDS.len() + RESIDENTIAL_GAS_FIELDS.len()
        );
        assert!(schema.contains_key("pdr"));
        assert!(!schema.contains_key("pod"));
        assert_eq!(schema.keys().next(), Some("name"));
        assert_eq!(schema.keys().last(), Some("gas_total_annual_consumption"));
    }

    #[test]
    fn test_dual_schema_orders_gas_before_power() {
        let registry = SchemaRegistry::builtin();
        let keys: Vec<_> = registry
            .invoice_schema(CustomerType::Microbusiness, Commodity::Dual)
            .keys()
            .collect();

        let pdr = keys.iter().position(|k| *k == "pdr").unwrap();
        let pod = keys.iter().position(|k| *k == "pod").unwrap();
        let company = keys.iter().position(|k| *k == "company_name").unwrap();
        assert_eq!(company, 0);
        assert!(pdr < pod);
        assert!(keys.contains(&"supply_voltage"));
    }

    #[test]
    fn test_merge_is_first_write_wins() {
        let common = FieldSchema::from_pairs(&[("shared", "Common label")]);
        let merged = common.merged_with(&[
            FieldSpec::new("shared", "Gas label", ""),
            FieldSpec::new("extra", "Extra", ""),
        ]);

        assert_eq!(merged.get("shared").unwrap().label, "Common label");
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["shared", "extra"]);
        // Source schema is untouched
        assert_eq!(common.len(), 1);
    }

    #[test]
    fn test_dual_merge_keeps_gas_definition_of_shared_key() {
        let schemas = CustomerSchemas::new(
            &[FieldSpec::new("name", "Name", "")],
            &[
                FieldSpec::new("pdr", "PDR", ""),
                FieldSpec::new("meter_id", "Gas meter", ""),
            ],
            &[
                FieldSpec::new("meter_id", "Power meter", ""),
                FieldSpec::new("pod", "POD", ""),
            ],
        );

        let dual = schemas.merge_for(Commodity::Dual);
        assert_eq!(dual.keys().collect::<Vec<_>>(), vec!["name", "pdr", "meter_id", "pod"]);
        assert_eq!(dual.get("meter_id").unwrap().label, "Gas meter");

        let power = schemas.merge_for(Commodity::Power);
        assert_eq!(power.keys().collect::<Vec<_>>(), vec!["name", "meter_id", "pod"]);
        assert_eq!(power.get("meter_id").unwrap().label, "Power meter");
    }

    #[test]
    fn test_selections_do_not_leak_between_requests() {
        let registry = SchemaRegistry::builtin();
        let dual = registry.invoice_schema(CustomerType::Residential, Commodity::Dual);
        let gas = registry.invoice_schema(CustomerType::Residential, Commodity::Gas);

        assert!(dual.contains_key("pod"));
        assert!(!gas.contains_key("pod"));
        assert_eq!(registry, SchemaRegistry::builtin());
    }

    #[test]
    fn test_identity_plan_has_no_root() {
        let registry = SchemaRegistry::builtin();
        let selection = Selection {
            category: DocumentCategory::Identity,
            ..Selection::default()
        };
        let (schema, root) = registry.plan_for(&selection);
        assert_eq!(root, None);
        assert_eq!(schema.keys().next(), Some("campi_documento.nome"));
    }

    #[test]
    fn test_display_label_falls_back_to_key() {
        let field = FieldSpec::new("gas_total_annual_consumption", "  ", "");
        assert_eq!(field.display_label(), "Gas total annual consumption");
        assert_eq!(field.icon(), None);
    }
}
