//! Shop Domain - tenant key
//!
//! Shopify の各テナントは `<name>.myshopify.com` で識別されます。
//! スケジューラ・ゲートウェイ・永続化層はすべてこの値をキーにします。
//!
//! ## 不変条件
//! - 小文字に正規化済み
//! - `.myshopify.com` で終わる
//! - サブドメイン部分は ASCII 英数字と `-` のみ、先頭は英数字

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Required suffix for every shop domain
pub const SHOP_DOMAIN_SUFFIX: &str = ".myshopify.com";

/// Maximum length of the subdomain part
pub const SHOP_NAME_MAX_LENGTH: usize = 60;

/// Shop domain validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShopDomainError {
    #[error("Shop domain cannot be empty")]
    Empty,

    #[error("Shop domain must end with {SHOP_DOMAIN_SUFFIX}")]
    MissingSuffix,

    #[error("Shop name must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Shop name contains invalid character: {0:?}")]
    InvalidCharacter(char),

    #[error("Shop name must start with a letter or digit")]
    InvalidStart,
}

/// Validated shop domain (tenant key)
///
/// ## Examples
/// ```rust
/// use kernel::shop::ShopDomain;
///
/// let shop = ShopDomain::parse(" My-Store.myshopify.com ").unwrap();
/// assert_eq!(shop.as_str(), "my-store.myshopify.com");
/// assert_eq!(shop.name(), "my-store");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
    /// 入力を正規化して検証する
    pub fn parse(raw: &str) -> Result<Self, ShopDomainError> {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        let name = normalized
            .strip_suffix(SHOP_DOMAIN_SUFFIX)
            .ok_or(ShopDomainError::MissingSuffix)?;

        if name.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        let len = name.chars().count();
        if len > SHOP_NAME_MAX_LENGTH {
            return Err(ShopDomainError::TooLong {
                max: SHOP_NAME_MAX_LENGTH,
                actual: len,
            });
        }

        if let Some(bad) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
        {
            return Err(ShopDomainError::InvalidCharacter(bad));
        }

        if name.starts_with('-') {
            return Err(ShopDomainError::InvalidStart);
        }

        Ok(Self(normalized))
    }

    /// Full domain, e.g. `my-store.myshopify.com`
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Subdomain part without the `.myshopify.com` suffix
    pub fn name(&self) -> &str {
        self.0
            .strip_suffix(SHOP_DOMAIN_SUFFIX)
            .unwrap_or(self.0.as_str())
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ShopDomain {
    type Error = ShopDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopDomain> for String {
    fn from(shop: ShopDomain) -> Self {
        shop.0
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
