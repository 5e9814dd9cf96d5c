use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct ComplianceInputDoc {
    pub manufacturer_name: Option<String>,
    pub manufacturer_address: Option<String>,
    pub manufacturer_email: Option<String>,
    pub eu_representative: Option<String>,
    pub safety_information: Option<String>,
    pub warnings: Vec<String>,
}

#[derive(ToSchema)]
pub struct VariantDoc { pub id: u64, pub price: u64, pub is_enabled: Option<bool> }

#[derive(ToSchema)]
pub struct CreateProductDoc {
    pub title: String,
    pub description: Option<String>,
    pub blueprint_id: u64,
    pub print_provider_id: u64,
    pub variants: Vec<VariantDoc>,
    #[schema(value_type = Object)]
    pub print_areas: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(ToSchema)]
pub struct LineItemDoc { pub product_id: String, pub variant_id: u64, pub quantity: u32 }

#[derive(ToSchema)]
pub struct SubmitOrderDoc {
    pub external_id: String,
    pub label: Option<String>,
    pub line_items: Vec<LineItemDoc>,
    pub shipping_method: Option<u32>,
    pub send_shipping_notification: Option<bool>,
    #[schema(value_type = Object)]
    pub address_to: String,
}

#[derive(ToSchema)]
pub struct QuoteItemDoc { pub variant_id: Option<u64>, pub quantity: u32 }

#[derive(ToSchema)]
pub struct ShippingQuoteDoc {
    /// ISO 3166-1 alpha-2
    pub country: String,
    pub items: Vec<QuoteItemDoc>,
    /// `standard` (default) or `express`
    pub method: Option<String>,
}

#[derive(ToSchema)]
pub struct GenerateMockupsDoc { pub product_id: String, pub variant_ids: Option<Vec<u64>> }

#[derive(ToSchema)]
pub struct TrackingEventDoc {
    /// pending, on_hold, sending_to_production, in_production, shipped, delivered, canceled, failed
    pub status: String,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub note: Option<String>,
    /// RFC 3339; defaults to now
    pub occurred_at: Option<String>,
}

#[derive(ToSchema)]
pub struct BulkRequestDoc {
    pub product_ids: Vec<String>,
    /// Tagged by `type`: publish, unpublish, delete, update_price, update_sku, enable_variants, disable_variants
    #[schema(value_type = Object)]
    pub operation: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::products::list,
        crate::routes::products::create,
        crate::routes::products::get,
        crate::routes::orders::submit,
        crate::routes::shipping::quote,
        crate::routes::compliance::get,
        crate::routes::compliance::upsert,
        crate::routes::mockups::generate,
        crate::routes::tracking::get,
        crate::routes::tracking::record_event,
        crate::routes::bulk::execute,
        crate::routes::bulk::get,
    ),
    components(
        schemas(
            HealthResponse,
            ComplianceInputDoc,
            VariantDoc,
            CreateProductDoc,
            LineItemDoc,
            SubmitOrderDoc,
            QuoteItemDoc,
            ShippingQuoteDoc,
            GenerateMockupsDoc,
            TrackingEventDoc,
            BulkRequestDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "products"),
        (name = "orders"),
        (name = "shipping"),
        (name = "compliance"),
        (name = "mockups"),
        (name = "tracking"),
        (name = "bulk")
    )
)]
pub struct ApiDoc;
