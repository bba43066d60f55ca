//! Last-loaded catalog plus the client-fixed product and circle lists.

use shared::{domain::ProductId, protocol::Catalog};

/// Ids eligible for the sold-products picker and for individual pitch deck
/// downloads. Client-defined, independent of catalog contents.
pub const ALLOWED_PRODUCT_IDS: [&str; 14] = [
    "MPLS",
    "ILL",
    "SD_WAN",
    "IOT",
    "DARK_FIBER",
    "VSAT",
    "CNPN_PRIVATE_5G",
    "DATA_CENTRE_SERVICES",
    "WIFI",
    "SIP",
    "CCTV",
    "BULK_FTTH",
    "BULK_SMS_CPAAS",
    "ISDN_PRI_SERVICES",
];

/// Placeholder entry shown before an industry is picked.
pub const INDUSTRY_PLACEHOLDER: &str = "Select an Industry";

/// Territory circles offered by the region picker.
pub const CIRCLES: [&str; 32] = [
    "Andhra Pradesh",
    "Assam",
    "Bihar",
    "Chennai",
    "Delhi",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jammu & Kashmir",
    "Karnataka",
    "Kerala",
    "Kolkata",
    "Madhya Pradesh",
    "Maharashtra",
    "Mumbai",
    "North East 1",
    "North East 2",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Tamil Nadu",
    "Uttar Pradesh (East)",
    "Uttar Pradesh (West)",
    "West Bengal",
    "Chhattisgarh",
    "Andaman & Nicobar",
    "Jharkhand",
    "Sikkim",
    "Telangana",
    "Uttarakhand",
    "CNTX N",
    "CNTX S",
];

/// Case-insensitive substring filter backing the searchable circle picker.
pub fn filter_circles(filter: &str) -> Vec<&'static str> {
    let needle = filter.to_lowercase();
    CIRCLES
        .into_iter()
        .filter(|circle| circle.to_lowercase().contains(&needle))
        .collect()
}

/// Holds the last successfully fetched catalog. Read-only between loads; a
/// reload replaces the whole catalog in one assignment, so readers never see
/// a half-written one.
#[derive(Debug, Clone, Default)]
pub struct CatalogCache {
    current: Option<Catalog>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, catalog: Catalog) {
        self.current = Some(catalog);
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&Catalog> {
        self.current.as_ref()
    }

    /// Catalog name for `id` when present, else the humanized id.
    pub fn display_name(&self, id: &ProductId) -> String {
        self.current
            .as_ref()
            .and_then(|catalog| catalog.product_name(id))
            .map(str::to_string)
            .unwrap_or_else(|| id.humanized())
    }

    /// Whether `industry` is one of the options offered by the loaded
    /// catalog. Nothing is offered before the first load.
    pub fn offers_industry(&self, industry: &str) -> bool {
        self.current
            .as_ref()
            .map(|catalog| catalog.industries.iter().any(|i| i == industry))
            .unwrap_or(false)
    }

    /// Industry selector entries: the unselected placeholder followed by the
    /// catalog industries in catalog order.
    pub fn industry_options(&self) -> Vec<String> {
        let mut options = vec![INDUSTRY_PLACEHOLDER.to_string()];
        if let Some(catalog) = &self.current {
            options.extend(catalog.industries.iter().cloned());
        }
        options
    }

    /// Entries for the mark-as-sold picker: every allowed id with its display
    /// name, in the fixed allowed order.
    pub fn sold_picker_options(&self) -> Vec<(ProductId, String)> {
        ALLOWED_PRODUCT_IDS
            .into_iter()
            .map(|id| {
                let id = ProductId::from(id);
                let name = self.display_name(&id);
                (id, name)
            })
            .collect()
    }
}
