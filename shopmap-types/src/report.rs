use crate::shop::ShopPoint;
use serde::{Deserialize, Serialize};

/// Maximum title length accepted by the report service.
pub const MAX_TITLE_LEN: usize = 200;

/// Category of a user-submitted problem report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// The shop does not exist or is closed
    ShopNotExists,
    /// The marker is in the wrong place
    WrongLocation,
    /// The shop has none of the listed products
    NoProducts,
    /// The shop sells different products than listed
    WrongProducts,
    /// Map or search malfunction
    AppBug,
    /// A shop nearby is missing from the map
    MissingShop,
    FeatureRequest,
    Other,
}

impl ReportKind {
    pub const ALL: [ReportKind; 8] = [
        ReportKind::ShopNotExists,
        ReportKind::WrongLocation,
        ReportKind::NoProducts,
        ReportKind::WrongProducts,
        ReportKind::AppBug,
        ReportKind::MissingShop,
        ReportKind::FeatureRequest,
        ReportKind::Other,
    ];

    /// Whether this kind of report is about one specific shop on the map.
    pub fn is_shop_specific(&self) -> bool {
        matches!(
            self,
            ReportKind::ShopNotExists
                | ReportKind::WrongLocation
                | ReportKind::NoProducts
                | ReportKind::WrongProducts
        )
    }
}

/// Where a report was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportSource {
    /// Opened from a shop card on the map
    Map,
    #[default]
    General,
}

/// Payload of the report submission endpoint.
///
/// # Examples
///
/// ```
/// use shopmap_types::report::{ReportKind, ReportRequest};
/// use shopmap_types::shop::ShopPoint;
///
/// let shop = ShopPoint::new("Żabka", "zabka", "Nowy Świat 5", 52.23, 21.02);
/// let report = ReportRequest::for_shop(ReportKind::WrongLocation, &shop, "Marker is one street off");
/// assert!(report.validate().is_ok());
///
/// let empty = ReportRequest::general(ReportKind::AppBug, "", "Search hangs");
/// assert!(empty.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub report_type: ReportKind,
    #[serde(default)]
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub source: ReportSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_lon: Option<f64>,
}

impl ReportRequest {
    /// A report not tied to a shop; the title is mandatory.
    pub fn general(
        kind: ReportKind,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            report_type: kind,
            title: title.into(),
            description: description.into(),
            user_email: String::new(),
            source: ReportSource::General,
            shop_name: None,
            shop_lat: None,
            shop_lon: None,
        }
    }

    /// A report about `shop`, started from its card on the map.
    pub fn for_shop(kind: ReportKind, shop: &ShopPoint, description: impl Into<String>) -> Self {
        Self {
            report_type: kind,
            title: String::new(),
            description: description.into(),
            user_email: String::new(),
            source: ReportSource::Map,
            shop_name: Some(shop.name.clone()),
            shop_lat: Some(shop.lat),
            shop_lon: Some(shop.lon),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.user_email = email.into();
        self
    }

    /// Check the fields the report service requires.
    pub fn validate(&self) -> Result<(), String> {
        if self.description.trim().is_empty() {
            return Err("Report description must not be empty".to_string());
        }

        if self.source == ReportSource::General && self.title.trim().is_empty() {
            return Err("General reports need a title".to_string());
        }

        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(format!(
                "Report title is longer than {} characters",
                MAX_TITLE_LEN
            ));
        }

        if self.source == ReportSource::Map
            && (self.shop_lat.is_none() || self.shop_lon.is_none())
        {
            return Err("Map reports must carry the shop coordinates".to_string());
        }

        let email = self.user_email.trim();
        if !email.is_empty() && !email.contains('@') {
            return Err(format!("Invalid contact email: {}", email));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ReportKind::ShopNotExists).unwrap();
        assert_eq!(json, "\"shop_not_exists\"");
        let kind: ReportKind = serde_json::from_str("\"feature_request\"").unwrap();
        assert_eq!(kind, ReportKind::FeatureRequest);
    }

    #[test]
    fn test_shop_report_payload_shape() {
        let shop = ShopPoint::new("Dino", "dino", "", 51.1, 17.0);
        let report = ReportRequest::for_shop(ReportKind::NoProducts, &shop, "Nothing on shelves");
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["source"], "map");
        assert_eq!(value["shop_name"], "Dino");
        assert_eq!(value["shop_lat"], 51.1);
    }

    #[test]
    fn test_general_report_omits_shop_fields() {
        let report = ReportRequest::general(ReportKind::MissingShop, "Missing", "Corner shop");
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("shop_name").is_none());
        assert_eq!(value["source"], "general");
    }

    #[test]
    fn test_validation_rules() {
        let blank = ReportRequest::general(ReportKind::Other, "Title", "   ");
        assert!(blank.validate().is_err());

        let long_title = ReportRequest::general(ReportKind::Other, "x".repeat(201), "desc");
        assert!(long_title.validate().is_err());

        let bad_email = ReportRequest::general(ReportKind::Other, "t", "d").with_email("nope");
        assert!(bad_email.validate().is_err());

        let ok = ReportRequest::general(ReportKind::Other, "t", "d").with_email("a@b.pl");
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_shop_specific_kinds() {
        let specific = ReportKind::ALL.iter().filter(|k| k.is_shop_specific()).count();
        assert_eq!(specific, 4);
    }
}
