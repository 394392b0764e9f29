use model::range::DateRange;
use url::Url;

use crate::{config::PortalConfig, error::PageError};

const RESULTS_ANCHOR: &str = "hash_results";

pub fn listing_url(config: &PortalConfig, range: &DateRange) -> Result<Url, PageError> {
    let mut url = Url::parse(&config.base_url)?.join(&config.listing_path)?;
    url.query_pairs_mut()
        .clear()
        .append_pair("trainerId", &config.trainer_id)
        .append_pair("startDate", &range.start_param())
        .append_pair("endDate", &range.end_param())
        .append_pair("statusId", &config.status_id)
        .append_pair("searchType", &config.search_type);
    url.set_fragment(Some(RESULTS_ANCHOR));
    Ok(url)
}

pub fn login_url(config: &PortalConfig) -> Result<Url, PageError> {
    Ok(Url::parse(&config.base_url)?.join(&config.login_path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_url() {
        let config = PortalConfig::new("https://portal.test", "639");
        let range = DateRange::parse("01-09-2026", "30-09-2026").unwrap();
        let url = listing_url(&config, &range).unwrap();
        assert_eq!(
            "https://portal.test/nl/academy-opvolging-lessen?trainerId=639&startDate=01-09-2026\
             &endDate=30-09-2026&statusId=5&searchType=lessen#hash_results",
            url.as_str()
        );
    }

    #[test]
    fn test_login_url() {
        let config = PortalConfig::new("https://portal.test/", "639");
        assert_eq!("https://portal.test/login", login_url(&config).unwrap().as_str());
    }

    #[test]
    fn test_invalid_base() {
        let config = PortalConfig::new("not a url", "639");
        assert!(login_url(&config).is_err());
    }
}
