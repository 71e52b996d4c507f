//! Query payloads accepted by the HTTP front end.

use crate::error::IngestError;
use crate::task::{IngestTask, validate_hash, validate_url};
use serde::{Deserialize, Serialize};

/// `GET /dl?url=..&md5=..`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadQuery {
    pub url: Option<String>,
    pub md5: Option<String>,
}

impl DownloadQuery {
    pub fn into_task(self) -> Result<IngestTask, IngestError> {
        let url = self.url.unwrap_or_default();
        let md5 = self.md5.unwrap_or_default();
        IngestTask::parse(&url, &md5)
    }
}

/// `GET /st[?url=..[&md5=..]]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticQuery {
    pub url: Option<String>,
    pub md5: Option<String>,
}

/// What a statistics request asks for once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatisticFilter {
    All,
    Url(String),
    UrlAndHash(String, String),
}

impl StatisticQuery {
    pub fn into_filter(self) -> Result<StatisticFilter, IngestError> {
        match (self.url, self.md5) {
            (None, None) => Ok(StatisticFilter::All),
            (None, Some(_)) => Err(IngestError::InvalidUrl(
                "md5 filter requires a url".to_string(),
            )),
            (Some(url), None) => {
                validate_url(&url)?;
                Ok(StatisticFilter::Url(url))
            }
            (Some(url), Some(md5)) => {
                validate_url(&url)?;
                validate_hash(&md5)?;
                Ok(StatisticFilter::UrlAndHash(url, md5))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "9d15d120a60995be4f66a30ff66be684";

    #[test]
    fn download_query_requires_both_fields() {
        let ok = DownloadQuery {
            url: Some("http://h/a.mp4".into()),
            md5: Some(HASH.into()),
        };
        assert_eq!(ok.into_task().unwrap(), IngestTask::new("http://h/a.mp4", HASH));

        let missing_md5 = DownloadQuery {
            url: Some("http://h/a.mp4".into()),
            md5: None,
        };
        assert!(matches!(missing_md5.into_task(), Err(IngestError::InvalidHash(_))));

        assert!(matches!(
            DownloadQuery::default().into_task(),
            Err(IngestError::InvalidUrl(_))
        ));
    }

    #[test]
    fn statistic_query_filters() {
        assert_eq!(
            StatisticQuery::default().into_filter().unwrap(),
            StatisticFilter::All
        );
        assert_eq!(
            StatisticQuery {
                url: Some("http://h/a.mp4".into()),
                md5: None
            }
            .into_filter()
            .unwrap(),
            StatisticFilter::Url("http://h/a.mp4".into())
        );
        assert!(
            StatisticQuery {
                url: Some("not a url".into()),
                md5: None
            }
            .into_filter()
            .is_err()
        );
        assert!(
            StatisticQuery {
                url: Some("http://h/a.mp4".into()),
                md5: Some("short".into())
            }
            .into_filter()
            .is_err()
        );
    }
}
