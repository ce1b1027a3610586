//! Uploading an augmented table to the survey host as a new survey.

use chrono::NaiveDateTime;
use reqwest::{
    blocking::{multipart, Client},
    header::{COOKIE, REFERER, USER_AGENT},
    StatusCode,
};

use crate::{error::{Error, Result}, table::FeatureTable};

const AGENT: &str = "suave user agent";

/// How to authenticate with the survey host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Auth {
    /// Log in with a user name and password; the session cookie is kept for the upload.
    Login { user: String, password: String },
    /// Reuse an existing session cookie header.
    Cookie(String),
}

/// A successful upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Where the new survey can be viewed.
    pub url: String,
}

/// Everything an upload needs besides the table.
#[derive(Clone, Debug)]
pub struct PublishRequest<'a> {
    /// Name of the new survey, without `.csv`.
    pub survey_name: &'a str,
    /// Owner of the new survey.
    pub user: &'a str,
    pub auth: &'a Auth,
    /// Base URL of the host, ending in `/`.
    pub referer: &'a str,
    /// Deep-zoom collection to attach, if any.
    pub dzc: Option<&'a str>,
}

/// URL under which the host serves a survey uploaded by `user` as `survey_name`.
pub fn survey_url(referer: &str, user: &str, survey_name: &str) -> String {
    format!("{referer}main/file={user}_{survey_name}.csv")
}

/// Default name for a survey derived from `csv`: the file stem without its
/// owner prefix (everything up to the first `_`), stamped with `now`.
pub fn suggested_survey_name(csv: &str, now: NaiveDateTime) -> String {
    let stem = csv.replace(".csv", "");
    let base = stem.split_once('_').map_or(stem.as_str(), |(_, rest)| rest);
    format!("{base}_{}", now.format("%Y%m%d_%H%M%S"))
}

/// [`suggested_survey_name`] stamped with the local time.
pub fn suggested_survey_name_now(csv: &str) -> String {
    suggested_survey_name(csv, chrono::Local::now().naive_local())
}

fn failure(what: &str, response: reqwest::blocking::Response) -> Error {
    let status = response.status();
    let reason = status.canonical_reason().unwrap_or("");
    let body = response.text().unwrap_or_default();
    Error::PublishFailed(format!("{what} failed ({} {reason}): {body}", status.as_u16()))
}

/// Upload `table` as a new survey. Only a `200 OK` counts as success; nothing is retried.
pub fn publish(table: &FeatureTable, request: &PublishRequest<'_>) -> Result<PublishOutcome> {
    if request.survey_name.trim().is_empty() {
        return Err(Error::PublishFailed("survey name is empty".into()));
    }

    let client = Client::builder()
        .cookie_store(true)
        .build()
        .map_err(|e| Error::PublishFailed(format!("cannot create HTTP client: {e}")))?;

    let cookie = match request.auth {
        Auth::Login { user, password } => {
            let response = client.post(request.referer)
                .header(USER_AGENT, AGENT)
                .header(REFERER, request.referer)
                .form(&[("user", user.as_str()), ("pass", password.as_str()), ("remember-me", "true")])
                .send()
                .map_err(|e| Error::PublishFailed(format!("login request: {e}")))?;
            if response.status() != StatusCode::OK {
                return Err(failure("login", response));
            }
            None
        }
        Auth::Cookie(cookie) => Some(cookie.as_str()),
    };

    let csv = table.to_csv_bytes()?;
    let file = multipart::Part::bytes(csv)
        .file_name(format!("{}.csv", request.survey_name))
        .mime_str("text/csv")
        .map_err(|e| Error::PublishFailed(e.to_string()))?;
    let mut form = multipart::Form::new()
        .part("file", file)
        .text("name", request.survey_name.to_string())
        .text("user", request.user.to_string());
    if let Some(dzc) = request.dzc {
        form = form.text("dzc", dzc.to_string());
    }

    let mut upload = client.post(format!("{}uploadCSV", request.referer))
        .header(USER_AGENT, AGENT)
        .header(REFERER, request.referer)
        .multipart(form);
    if let Some(cookie) = cookie {
        upload = upload.header(COOKIE, cookie);
    }
    let response = upload.send()
        .map_err(|e| Error::PublishFailed(format!("upload request: {e}")))?;
    if response.status() != StatusCode::OK {
        return Err(failure("upload", response));
    }

    Ok(PublishOutcome { url: survey_url(request.referer, request.user, request.survey_name) })
}
