//! Share link extracted from a chat message.

use url::Url;

/// A recognised share link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    /// Matched text exactly as it appeared in the message
    pub raw_text: String,

    /// Same link on the primary domain
    pub canonical_url: String,

    /// Whether the match was on a mirror domain
    pub is_mirror: bool,
}

impl ShareLink {
    /// Share code: the first path segment after `/s/`.
    pub fn share_code(&self) -> Option<&str> {
        let after_scheme = self.canonical_url.split_once("://")?.1;
        let path = after_scheme.split_once('/')?.1;
        let code = path.strip_prefix("s/")?;
        let end = code.find(['/', '?', '#']).unwrap_or(code.len());
        let code = &code[..end];
        (!code.is_empty()).then_some(code)
    }

    /// Access password: `password` or `pwd` query parameter, else the fragment.
    pub fn password(&self) -> Option<String> {
        let url = Url::parse(&self.canonical_url).ok()?;
        url.query_pairs()
            .find(|(key, value)| (key == "password" || key == "pwd") && !value.is_empty())
            .map(|(_, value)| value.into_owned())
            .or_else(|| {
                url.fragment()
                    .filter(|fragment| !fragment.is_empty())
                    .map(str::to_string)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(url: &str) -> ShareLink {
        ShareLink {
            raw_text: url.to_string(),
            canonical_url: url.to_string(),
            is_mirror: false,
        }
    }

    #[test]
    fn test_share_code() {
        assert_eq!(
            link("https://115.com/s/sw3abc?password=x1y2#").share_code(),
            Some("sw3abc")
        );
        assert_eq!(link("https://115.com/s/abc123#pwd").share_code(), Some("abc123"));
        assert_eq!(link("https://115.com/s/").share_code(), None);
        assert_eq!(link("https://115.com/file/abc").share_code(), None);
    }

    #[test]
    fn test_password() {
        assert_eq!(
            link("https://115.com/s/sw3abc?password=x1y2#").password(),
            Some("x1y2".to_string())
        );
        assert_eq!(
            link("https://115.com/s/sw3abc?pwd=z9").password(),
            Some("z9".to_string())
        );
        assert_eq!(
            link("https://115.com/s/abc123#pwd").password(),
            Some("pwd".to_string())
        );
        assert_eq!(link("https://115.com/s/abc123").password(), None);
    }
}
