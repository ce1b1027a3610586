//! Locating and fetching a survey's CSV on the survey host.

use reqwest::Url;

use crate::{error::{Error, Result}, table::FeatureTable};

/// Host used when no survey URL is given.
pub const DEFAULT_HOST: &str = "https://suave-net.sdsc.edu/";

/// A survey as identified by the host's launch parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurveyLocation {
    survey_url: Url,
    csv: String,
}

impl SurveyLocation {
    /// `survey_url` is the page the survey is viewed at; `csv` the survey's CSV file name.
    pub fn new(survey_url: Option<&str>, csv: &str) -> Result<Self> {
        let survey_url = survey_url.unwrap_or(DEFAULT_HOST);
        let survey_url = Url::parse(survey_url)
            .map_err(|e| Error::Source(format!("invalid survey URL {survey_url:?}: {e}")))?;
        if survey_url.host_str().is_none() {
            return Err(Error::Source(format!("survey URL {survey_url} has no host")));
        }
        if csv.trim().is_empty() {
            return Err(Error::Source("no CSV file name given".into()));
        }
        Ok(Self { survey_url, csv: csv.trim().to_string() })
    }

    #[inline] pub fn csv(&self) -> &str { &self.csv }

    #[inline] pub fn survey_url(&self) -> &Url { &self.survey_url }

    /// `{scheme}://{host}/surveys/{csv}`.
    pub fn csv_url(&self) -> Result<Url> {
        self.survey_url.join(&format!("/surveys/{}", self.csv))
            .map_err(|e| Error::Source(format!("cannot build CSV URL for {:?}: {e}", self.csv)))
    }

    /// The survey URL up to `/main`, with a trailing slash. Login and upload requests go here.
    pub fn referer(&self) -> String {
        let url = self.survey_url.as_str();
        let base = url.split("/main").next().unwrap_or(url);
        format!("{}/", base.trim_end_matches('/'))
    }

    /// Download and parse the survey's CSV.
    pub fn fetch(&self) -> Result<FeatureTable> {
        let url = self.csv_url()?;
        let bytes = reqwest::blocking::get(url.clone())
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.bytes())
            .map_err(|e| Error::Source(format!("GET {url}: {e}")))?;
        FeatureTable::from_csv_bytes(&bytes)
    }
}
