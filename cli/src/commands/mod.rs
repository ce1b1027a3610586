pub mod columns;
pub mod derive;
pub mod gwr;
pub mod publish;

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use suave_spatial::{
    publish::{self as upload, Auth, PublishRequest},
    survey::SurveyLocation,
    FeatureTable,
};

use crate::cli::{SourceArgs, UploadArgs};

/// A loaded survey and where it came from.
pub struct Loaded {
    pub table: FeatureTable,
    pub location: Option<SurveyLocation>,
    /// File name used to suggest a name for the published survey.
    pub csv_name: String,
}

pub fn load(source: &SourceArgs, verbose: u8) -> Result<Loaded> {
    if let Some(path) = &source.input {
        if verbose > 0 { eprintln!("[source] reading {}", path.display()); }
        let table = FeatureTable::read_csv(path)?;
        let csv_name = match &source.csv {
            Some(csv) => csv.clone(),
            None => path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
        };
        let location = match &source.survey_url {
            Some(url) => Some(SurveyLocation::new(Some(url.as_str()), &csv_name)?),
            None => None,
        };
        return Ok(Loaded { table, location, csv_name });
    }

    let Some(csv) = &source.csv else { bail!("[source] give either --input or --csv") };
    let location = SurveyLocation::new(source.survey_url.as_deref(), csv)?;
    if verbose > 0 { eprintln!("[source] GET {}", location.csv_url()?); }
    let table = location.fetch()?;
    Ok(Loaded { table, location: Some(location), csv_name: csv.clone() })
}

pub fn write_file(path: &Path, bytes: &[u8], verbose: u8) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("[output] Failed to create {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("[output] Failed to write {}", path.display()))?;
    if verbose > 0 { eprintln!("[output] wrote {}", path.display()); }
    Ok(())
}

/// Upload `table` as configured by `args`, printing the new survey's URL.
pub fn publish_table(table: &FeatureTable, args: &UploadArgs, referer: &str, csv_name: &str, verbose: u8) -> Result<()> {
    let Some(user) = &args.user else { bail!("[publish] --user is required to publish") };
    let auth = match (&args.cookie, &args.password) {
        (Some(cookie), _) => Auth::Cookie(cookie.clone()),
        (None, Some(password)) => Auth::Login { user: user.clone(), password: password.clone() },
        (None, None) => bail!("[publish] give --password (or SUAVE_PASSWORD) or --cookie"),
    };
    let survey_name = args.survey_name.clone()
        .unwrap_or_else(|| upload::suggested_survey_name_now(csv_name));

    if verbose > 0 { eprintln!("[publish] uploading {survey_name:?} to {referer}"); }
    let outcome = upload::publish(table, &PublishRequest {
        survey_name: &survey_name,
        user,
        auth: &auth,
        referer,
        dzc: args.dzc.as_deref(),
    })?;
    println!("{}", outcome.url);
    Ok(())
}
