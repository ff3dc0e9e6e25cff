use serde::{Deserialize, Serialize};

/// Entry of a lookup table (categories, vendors, storage locations).
///
/// Vendors name their label column `vendor_name`; it is accepted as an alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupOption<I> {
    pub id: I,
    #[serde(alias = "vendor_name")]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinicstock_core::VendorId;
    use serde_json::json;

    #[test]
    fn vendor_rows_use_vendor_name() {
        let id = VendorId::new();
        let opt: LookupOption<VendorId> =
            serde_json::from_value(json!({ "id": id.to_string(), "vendor_name": "McKesson" }))
                .unwrap();
        assert_eq!(opt.id, id);
        assert_eq!(opt.name, "McKesson");
    }
}
