use std::time::Duration;

use serde::{Deserialize, Serialize};

/// User-Agent substrings that mark a client as handheld.
const MOBILE_MARKERS: &[&str] = &[
    "android",
    "iphone",
    "ipad",
    "ipod",
    "mobile",
    "blackberry",
    "opera mini",
    "windows phone",
];

/// Client device class, derived from the User-Agent header.
///
/// Mobile clients get tighter limits end to end: a shorter generation
/// deadline, a capped query length, and a capped reply length in whole
/// delivery mode. Desktop clients have no length caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Desktop,
    Mobile,
}

impl DeviceClass {
    /// Classify a client from its raw User-Agent header. A missing header
    /// carries no mobile marker, so it classifies as Desktop.
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        let Some(ua) = user_agent else {
            return DeviceClass::Desktop;
        };
        let ua = ua.to_ascii_lowercase();
        if MOBILE_MARKERS.iter().any(|marker| ua.contains(marker)) {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }

    /// How long one generation attempt may run before it is abandoned.
    pub fn generation_deadline(&self) -> Duration {
        match self {
            DeviceClass::Desktop => Duration::from_secs(25),
            DeviceClass::Mobile => Duration::from_secs(10),
        }
    }

    /// Maximum query length in characters, if capped.
    pub fn query_char_limit(&self) -> Option<usize> {
        match self {
            DeviceClass::Desktop => None,
            DeviceClass::Mobile => Some(150),
        }
    }

    /// Maximum reply length in characters for whole delivery, if capped.
    pub fn reply_char_limit(&self) -> Option<usize> {
        match self {
            DeviceClass::Desktop => None,
            DeviceClass::Mobile => Some(1000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_common_agents() {
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
                      AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148";
        let android = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36";
        let desktop = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                       (KHTML, like Gecko) Chrome/122.0 Safari/537.36";

        assert_eq!(
            DeviceClass::from_user_agent(Some(iphone)),
            DeviceClass::Mobile
        );
        assert_eq!(
            DeviceClass::from_user_agent(Some(android)),
            DeviceClass::Mobile
        );
        assert_eq!(
            DeviceClass::from_user_agent(Some(desktop)),
            DeviceClass::Desktop
        );
    }

    #[test]
    fn test_missing_user_agent_is_desktop() {
        assert_eq!(DeviceClass::from_user_agent(None), DeviceClass::Desktop);
        assert_eq!(DeviceClass::from_user_agent(Some("")), DeviceClass::Desktop);
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        assert_eq!(
            DeviceClass::from_user_agent(Some("MOBILE Safari")),
            DeviceClass::Mobile
        );
    }

    #[test]
    fn test_policy_limits() {
        assert_eq!(
            DeviceClass::Mobile.generation_deadline(),
            Duration::from_secs(10)
        );
        assert_eq!(
            DeviceClass::Desktop.generation_deadline(),
            Duration::from_secs(25)
        );
        assert_eq!(DeviceClass::Mobile.query_char_limit(), Some(150));
        assert_eq!(DeviceClass::Desktop.query_char_limit(), None);
        assert_eq!(DeviceClass::Mobile.reply_char_limit(), Some(1000));
        assert_eq!(DeviceClass::Desktop.reply_char_limit(), None);
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DeviceClass::Desktop).unwrap(),
            "\"desktop\""
        );
        assert_eq!(
            serde_json::to_string(&DeviceClass::Mobile).unwrap(),
            "\"mobile\""
        );
    }
}
