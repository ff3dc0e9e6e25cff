use clinicstock_core::{CategoryId, LocationId, VendorId};
use clinicstock_gateway::{Gateway, collections, fetch_rows};
use clinicstock_inventory::LookupOption;

use crate::error::ClientError;
use crate::filters::lookup_query;

/// Choices for the category, vendor and location filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub categories: Vec<LookupOption<CategoryId>>,
    pub vendors: Vec<LookupOption<VendorId>>,
    pub locations: Vec<LookupOption<LocationId>>,
}

impl FilterOptions {
    pub async fn load<G>(gateway: &G) -> Result<Self, ClientError>
    where
        G: Gateway + ?Sized,
    {
        let categories = fetch_rows::<LookupOption<CategoryId>, _>(
            gateway,
            &lookup_query(collections::CATEGORIES, "name"),
        )
        .await?;
        let vendors = fetch_rows::<LookupOption<VendorId>, _>(
            gateway,
            &lookup_query(collections::VENDORS, "vendor_name"),
        )
        .await?;
        let locations = fetch_rows::<LookupOption<LocationId>, _>(
            gateway,
            &lookup_query(collections::STORAGE_LOCATIONS, "name"),
        )
        .await?;

        Ok(Self {
            categories: categories.rows,
            vendors: vendors.rows,
            locations: locations.rows,
        })
    }
}
