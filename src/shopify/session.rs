use chrono::{Datelike, NaiveDate, Utc};
use std::fmt;

use crate::error::InstallError;

const SHOP_SUFFIX: &str = ".myshopify.com";

/// A validated `<name>.myshopify.com` host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Accepts either the bare shop name or the full myshopify host.
    pub fn parse(raw: &str) -> Result<Self, InstallError> {
        let host = raw.trim().to_ascii_lowercase();
        let name = match host.strip_suffix(SHOP_SUFFIX) {
            Some(name) => name,
            None if !host.contains('.') => host.as_str(),
            None => {
                return Err(InstallError::InvalidParams(format!(
                    "shop must be a {SHOP_SUFFIX} domain: {raw}"
                )))
            }
        };

        let valid = !name.is_empty()
            && !name.starts_with('-')
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid {
            return Err(InstallError::InvalidParams(format!("invalid shop name: {raw}")));
        }

        Ok(Self(format!("{name}{SHOP_SUFFIX}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Admin API version: `unstable` or a quarterly stable release (`YYYY-MM`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiVersion {
    Unstable,
    Release { year: u16, month: u8 },
}

impl ApiVersion {
    /// Releases dated after the current month don't exist yet and are refused.
    pub fn parse(raw: &str) -> Result<Self, InstallError> {
        Self::parse_at(raw, Utc::now().date_naive())
    }

    fn parse_at(raw: &str, today: NaiveDate) -> Result<Self, InstallError> {
        let unsupported = || InstallError::UnsupportedApiVersion(raw.to_string());

        if raw == "unstable" {
            return Ok(ApiVersion::Unstable);
        }

        let (year, month) = raw.split_once('-').ok_or_else(unsupported)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(unsupported());
        }
        let year: u16 = year.parse().map_err(|_| unsupported())?;
        let month: u8 = month.parse().map_err(|_| unsupported())?;

        // Releases ship every quarter, starting with 2019-04.
        if !matches!(month, 1 | 4 | 7 | 10) || (year, month) < (2019, 4) {
            return Err(unsupported());
        }
        if (i32::from(year), u32::from(month)) > (today.year(), today.month()) {
            return Err(unsupported());
        }

        Ok(ApiVersion::Release { year, month })
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiVersion::Unstable => f.write_str("unstable"),
            ApiVersion::Release { year, month } => write!(f, "{year}-{month:02}"),
        }
    }
}

/// One shop, one API version, and the access token once we have it.
#[derive(Debug, Clone)]
pub struct Session {
    pub shop: ShopDomain,
    pub version: ApiVersion,
    pub token: Option<String>,
}

impl Session {
    pub fn new(shop: ShopDomain, version: ApiVersion) -> Self {
        Self {
            shop,
            version,
            token: None,
        }
    }

    pub fn with_token(shop: ShopDomain, version: ApiVersion, token: impl Into<String>) -> Self {
        Self {
            shop,
            version,
            token: Some(token.into()),
        }
    }

    /// The grant page the merchant is sent to during install.
    pub fn create_permission_url(
        &self,
        api_key: &str,
        scopes: &[String],
        redirect_uri: &str,
        state: &str,
    ) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", api_key)
            .append_pair("scope", &scopes.join(","))
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("state", state)
            .finish();

        format!("https://{}/admin/oauth/authorize?{query}", self.shop)
    }

    /// Versioned Admin REST endpoint, e.g. `webhooks.json`.
    pub fn admin_url(&self, resource: &str) -> String {
        format!("https://{}/admin/api/{}/{resource}", self.shop, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shop_domain_accepts_name_or_host() {
        assert_eq!(ShopDomain::parse("demo").unwrap().as_str(), "demo.myshopify.com");
        assert_eq!(
            ShopDomain::parse("Demo-Shop.myshopify.com").unwrap().as_str(),
            "demo-shop.myshopify.com"
        );
    }

    #[test]
    fn test_shop_domain_rejects_foreign_hosts() {
        assert!(ShopDomain::parse("evil.com").is_err());
        assert!(ShopDomain::parse("demo.myshopify.com.evil.com").is_err());
        assert!(ShopDomain::parse("a/b.myshopify.com").is_err());
        assert!(ShopDomain::parse(".myshopify.com").is_err());
        assert!(ShopDomain::parse("").is_err());
    }

    #[test]
    fn test_api_version_parse() {
        assert_eq!(
            ApiVersion::parse("2020-07").unwrap(),
            ApiVersion::Release { year: 2020, month: 7 }
        );
        assert_eq!(ApiVersion::parse("unstable").unwrap(), ApiVersion::Unstable);
        assert_eq!(ApiVersion::parse("2020-07").unwrap().to_string(), "2020-07");

        for bad in ["2020-06", "2019-01", "20-07", "2020-7", "latest", ""] {
            assert!(
                matches!(ApiVersion::parse(bad), Err(InstallError::UnsupportedApiVersion(_))),
                "{bad} should be unsupported"
            );
        }
    }

    #[test]
    fn test_api_version_rejects_unreleased() {
        assert!(matches!(
            ApiVersion::parse("2099-01"),
            Err(InstallError::UnsupportedApiVersion(_))
        ));

        let today = NaiveDate::from_ymd_opt(2021, 4, 1).unwrap();
        assert!(ApiVersion::parse_at("2021-04", today).is_ok());
        assert!(ApiVersion::parse_at("2021-07", today).is_err());
        assert!(ApiVersion::parse_at("unstable", today).is_ok());
    }

    #[test]
    fn test_permission_url() {
        let session = Session::new(
            ShopDomain::parse("demo").unwrap(),
            ApiVersion::parse("2020-07").unwrap(),
        );
        let url = session.create_permission_url(
            "key123",
            &["read_orders".into(), "write_script_tags".into()],
            "http://localhost:8080/shopify_token",
            "st8",
        );
        assert_eq!(
            url,
            "https://demo.myshopify.com/admin/oauth/authorize?client_id=key123\
             &scope=read_orders%2Cwrite_script_tags\
             &redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fshopify_token\
             &state=st8"
        );
    }

    #[test]
    fn test_admin_url() {
        let session = Session::with_token(
            ShopDomain::parse("demo").unwrap(),
            ApiVersion::parse("2020-07").unwrap(),
            "shpat_x",
        );
        assert_eq!(
            session.admin_url("webhooks.json"),
            "https://demo.myshopify.com/admin/api/2020-07/webhooks.json"
        );
    }
}
