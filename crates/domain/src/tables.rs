//! Table, bucket, and field names shared by the creation flows.

pub const TEAMS: &str = "teams";
pub const TEAM_MEMBERS: &str = "team_members";
pub const TEAM_SERVICE_TYPES: &str = "team_service_types";

pub const SERVICES: &str = "services";
pub const SERVICE_CLIENTS: &str = "service_clients";

pub const STORES: &str = "stores";
pub const STORE_CONTACTS: &str = "store_contacts";
pub const STORE_ADDRESSES: &str = "store_addresses";

pub const PRODUCTS: &str = "products";
pub const PRODUCT_IDENTIFIERS: &str = "product_identifiers";

/// Object storage buckets, one per attachment kind.
pub mod buckets {
    pub const TEAM_LOGOS: &str = "team-logos";
    pub const SERVICE_ATTACHMENTS: &str = "service-attachments";
    pub const STORE_IMAGES: &str = "store-images";
    pub const PRODUCT_MEDIA: &str = "product-media";
}

/// Foreign-key field linking dependent rows to their parent.
pub const TEAM_ID: &str = "team_id";
pub const SERVICE_ID: &str = "service_id";
pub const STORE_ID: &str = "store_id";
pub const PRODUCT_ID: &str = "product_id";
