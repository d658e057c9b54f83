use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

/// One shortened link as held by [`LinkStore`](super::LinkStore).
///
/// Field names on disk are `url`, `expires` and `uses`. The capitalised
/// aliases are what older snapshot files were written with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    #[serde(alias = "URL", deserialize_with = "legacy::deserialize_url")]
    pub url: Url,

    /// `None` never expires by time.
    #[serde(
        rename = "expires",
        alias = "Expires",
        default,
        deserialize_with = "legacy::deserialize_expiry"
    )]
    pub expires_at: Option<DateTime<Utc>>,

    /// `0` means unlimited.
    #[serde(rename = "uses", alias = "Uses", default)]
    pub remaining_uses: u32,
}

impl LinkRecord {
    pub fn new(url: Url, expires_at: Option<DateTime<Utc>>, remaining_uses: u32) -> Self {
        Self {
            url,
            expires_at,
            remaining_uses,
        }
    }

    /// True when the record carries an expiry strictly before `now`.
    #[inline]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }

    #[inline]
    pub fn is_use_limited(&self) -> bool {
        self.remaining_uses > 0
    }
}

/// Result of a successful [`LinkStore::fetch`](super::LinkStore::fetch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub record: LinkRecord,
    /// Set on the fetch that consumed the final use and evicted the record.
    pub was_last_use: bool,
}

mod legacy {
    //! Snapshot compatibility with the first generation of the service, which
    //! wrote URLs as decomposed objects and "never" as the zero timestamp.

    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum UrlRepr {
        Text(String),
        Parts(UrlParts),
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct UrlParts {
        scheme: String,
        #[serde(default)]
        opaque: String,
        #[serde(default)]
        user: Option<UserParts>,
        #[serde(default)]
        host: String,
        #[serde(default)]
        path: String,
        #[serde(default)]
        raw_path: String,
        #[serde(default)]
        force_query: bool,
        #[serde(default)]
        raw_query: String,
        #[serde(default)]
        fragment: String,
        #[serde(default)]
        raw_fragment: String,
    }

    /// Older writers emitted `{}` here, which carries nothing to restore.
    #[derive(Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct UserParts {
        #[serde(default, alias = "username")]
        username: String,
        #[serde(default, alias = "password")]
        password: Option<String>,
    }

    /// Decoded parts may hold a literal `%`; escape it before the setters
    /// see it so it is not read as the start of an escape.
    fn escape_percent(decoded: &str) -> String {
        decoded.replace('%', "%25")
    }

    impl UrlParts {
        fn to_url(&self) -> Result<Url, String> {
            let base = if self.opaque.is_empty() {
                format!("{}://{}", self.scheme, self.host)
            } else {
                format!("{}:{}", self.scheme, self.opaque)
            };
            let mut url = Url::parse(&base).map_err(|e| format!("invalid url {base:?}: {e}"))?;

            if self.opaque.is_empty() {
                if let Some(user) = &self.user {
                    if !user.username.is_empty() {
                        url.set_username(&user.username)
                            .map_err(|()| format!("cannot set user on {base:?}"))?;
                    }
                    if let Some(password) = &user.password {
                        url.set_password(Some(password))
                            .map_err(|()| format!("cannot set password on {base:?}"))?;
                    }
                }

                // 转义形式优先，否则由 url 对解码后的路径重新编码
                if !self.raw_path.is_empty() {
                    url.set_path(&self.raw_path);
                } else if !self.path.is_empty() {
                    url.set_path(&escape_percent(&self.path));
                }
            }

            if self.force_query || !self.raw_query.is_empty() {
                url.set_query(Some(&self.raw_query));
            }

            let fragment = if self.raw_fragment.is_empty() {
                escape_percent(&self.fragment)
            } else {
                self.raw_fragment.clone()
            };
            if !fragment.is_empty() {
                url.set_fragment(Some(&fragment));
            }

            Ok(url)
        }
    }

    pub fn deserialize_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
    where
        D: Deserializer<'de>,
    {
        match UrlRepr::deserialize(deserializer)? {
            UrlRepr::Text(text) => Url::parse(&text)
                .map_err(|e| serde::de::Error::custom(format!("invalid url {text:?}: {e}"))),
            UrlRepr::Parts(parts) => parts.to_url().map_err(serde::de::Error::custom),
        }
    }

    pub fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<DateTime<Utc>>::deserialize(deserializer)?;
        // 0001-01-01T00:00:00Z 表示永不过期
        Ok(value.filter(|at| at.year() > 1))
    }
}
