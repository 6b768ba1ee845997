//! Navigation links for the failure tables.
//!
//! Path segments (master, builder, slave and step names) are inserted
//! verbatim. They come from the buildbot feed's own vocabulary, not from
//! end users, so nothing here escapes them. Only the test name in a
//! flakiness dashboard link is percent-encoded.

use std::fmt::Display;
use std::sync::Arc;

use log::{debug, warn};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::registry::Registry;

pub const DEFAULT_FLAKINESS_DASHBOARD_URL: &str =
    "http://test-results.appspot.com/dashboards/flakiness_dashboard.html";

const CHROMIUM_MASTER_PREFIX: &str = "chromium.";

/// Characters JavaScript's `encodeURIComponent` escapes: everything except
/// ASCII alphanumerics and `-_.!~*'()`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// The slice of a buildbot failure record needed to build links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureContext {
    #[serde(default)]
    pub master_url: String,
    #[serde(default)]
    pub builder_name: String,
    #[serde(default)]
    pub slave_name: String,
    #[serde(default)]
    pub step_name: String,
}

/// What `master_display_name` shows when it is given no master URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingMasterLabel {
    /// Hand back the absent or empty input unchanged
    #[default]
    PassThrough,
    /// Show `FormatterOptions::placeholder_label` instead
    Placeholder,
}

/// How a flakiness dashboard link identifies the master.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlakinessAddressing {
    /// `master=<url path segment>`
    #[default]
    Master,
    /// `group=<first group of the master>`
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FormatterOptions {
    #[serde(default)]
    pub missing_master_label: MissingMasterLabel,

    #[serde(default = "default_placeholder_label")]
    pub placeholder_label: String,

    #[serde(default)]
    pub flakiness_addressing: FlakinessAddressing,

    #[serde(default = "default_flakiness_dashboard_url")]
    pub flakiness_dashboard_url: String,
}

impl Default for FormatterOptions {
    fn default() -> Self {
        Self {
            missing_master_label: MissingMasterLabel::default(),
            placeholder_label: default_placeholder_label(),
            flakiness_addressing: FlakinessAddressing::default(),
            flakiness_dashboard_url: default_flakiness_dashboard_url(),
        }
    }
}

fn default_placeholder_label() -> String {
    "foo".to_string()
}

fn default_flakiness_dashboard_url() -> String {
    DEFAULT_FLAKINESS_DASHBOARD_URL.to_string()
}

/// Builds every link and label the dashboard renders.
///
/// Holds a shared, read-only [`Registry`]; cloning a formatter is cheap and
/// any number of threads may use one concurrently.
#[derive(Debug, Clone)]
pub struct LinkFormatter {
    registry: Arc<Registry>,
    options: FormatterOptions,
}

impl LinkFormatter {
    pub fn new(registry: Arc<Registry>, options: FormatterOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn options(&self) -> &FormatterOptions {
        &self.options
    }

    pub fn change_url(&self, repo_name: &str, revision: &str) -> Result<String> {
        self.registry.change_url(repo_name, revision)
    }

    pub fn changelog_url(&self, repo_name: &str, start: &str, end: &str) -> Result<String> {
        self.registry.changelog_url(repo_name, start, end)
    }

    pub fn short_name(&self, repo_name: &str) -> Result<Option<&str>> {
        self.registry.short_name(repo_name)
    }

    /// Short label for a master, without the `chromium.` prefix.
    ///
    /// An absent or empty URL is handled according to
    /// [`FormatterOptions::missing_master_label`].
    pub fn master_display_name(&self, master_url: Option<&str>) -> Option<String> {
        match master_url.filter(|url| !url.is_empty()) {
            Some(url) => Some(short_master_name(master_url_path_segment(url)).to_string()),
            None => match self.options.missing_master_label {
                MissingMasterLabel::PassThrough => master_url.map(str::to_string),
                MissingMasterLabel::Placeholder => Some(self.options.placeholder_label.clone()),
            },
        }
    }

    /// First tree group of the master at `master_url`, if it is known.
    pub fn group_for_master(&self, master_url: &str) -> Option<&str> {
        let segment = master_url_path_segment(master_url);
        match self.registry.find_master_by_segment(segment) {
            Ok(master) => master.primary_group(),
            Err(_) => {
                debug!("No group for unknown master '{segment}'");
                None
            }
        }
    }

    /// Flakiness dashboard link for a failing test, or `""` when there is
    /// nothing to show (no test name, or a step that does not run tests).
    ///
    /// # Arguments
    ///
    /// * `test_name` - Failing test; the only percent-encoded value
    /// * `step_name` - Step that ran it (e.g., "browser_tests"); must contain "test"
    /// * `master_url` - Master URL, addressed per [`FormatterOptions::flakiness_addressing`]
    pub fn flakiness_dashboard_url(
        &self,
        test_name: Option<&str>,
        step_name: &str,
        master_url: &str,
    ) -> String {
        let Some(test_name) = test_name.filter(|name| !name.is_empty()) else {
            return String::new();
        };
        if !step_name.contains("test") {
            return String::new();
        }

        let segment = master_url_path_segment(master_url);
        let target = match self.options.flakiness_addressing {
            FlakinessAddressing::Master => format!("master={segment}"),
            FlakinessAddressing::Group => match self.group_for_master(master_url) {
                Some(group) => format!("group={group}"),
                None => {
                    warn!("Master '{segment}' has no group, addressing dashboard by master");
                    format!("master={segment}")
                }
            },
        };

        format!(
            "{}#testType={}&tests={}&{}",
            self.options.flakiness_dashboard_url,
            step_name,
            utf8_percent_encode(test_name, URI_COMPONENT),
            target
        )
    }
}

impl Default for LinkFormatter {
    fn default() -> Self {
        Self::new(Arc::new(Registry::builtin()), FormatterOptions::default())
    }
}

/// Last non-empty path segment of a master URL.
///
/// One trailing `/` is ignored, so `https://host/p/chromium.win/` and
/// `https://host/p/chromium.win` both yield `chromium.win`. When the URL
/// has a scheme, only the path after the authority counts. A URL without
/// any path segment (`""`, `/`, `https://`, `https://host`) yields `""`.
///
/// # Arguments
///
/// * `master_url` - Master URL (e.g., <https://build.chromium.org/p/chromium.win>)
///
/// # Returns
///
/// The master identifier used as the registry key (e.g., "chromium.win")
pub fn master_url_path_segment(master_url: &str) -> &str {
    let path = match master_url.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map_or("", |(_, path)| path),
        None => master_url,
    };
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    trimmed
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("")
}

/// Strips a leading `chromium.` from a master segment.
///
/// Only a prefix of the whole segment counts: `tryserver.chromium.gpu` is
/// returned unchanged.
pub fn short_master_name(segment: &str) -> &str {
    segment
        .strip_prefix(CHROMIUM_MASTER_PREFIX)
        .unwrap_or(segment)
}

/// Converts a failure to the buildbot page of the slave that ran it.
///
/// # Returns
///
/// `<master_url>/buildslaves/<slave_name>`
pub fn slave_url(failure: &FailureContext) -> String {
    format!("{}/buildslaves/{}", failure.master_url, failure.slave_name)
}

/// Converts a failure to its builder's buildbot page.
///
/// # Returns
///
/// `<master_url>/builders/<builder_name>`
pub fn builder_url(failure: &FailureContext) -> String {
    format!("{}/builders/{}", failure.master_url, failure.builder_name)
}

/// Converts a failure and build number to the build's page.
///
/// # Arguments
///
/// * `failure` - Failure carrying the master URL and builder name
/// * `build_number` - Buildbot build number (e.g., 31886)
///
/// # Returns
///
/// `<builder_url>/builds/<build_number>`
pub fn build_url(failure: &FailureContext, build_number: impl Display) -> String {
    format!("{}/builds/{build_number}", builder_url(failure))
}

/// Converts a failure and build number to the failing step's page.
///
/// # Returns
///
/// `<build_url>/steps/<step_name>`
pub fn step_url(failure: &FailureContext, build_number: impl Display) -> String {
    format!("{}/steps/{}", build_url(failure, build_number), failure.step_name)
}

/// Converts a failure and build number to the failing step's stdio log.
///
/// # Returns
///
/// `<step_url>/logs/stdio`
pub fn stdio_url(failure: &FailureContext, build_number: impl Display) -> String {
    format!("{}/logs/stdio", step_url(failure, build_number))
}

/// A step log location recovered from a stdio URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepLocation {
    pub master_url: String,
    pub builder_name: String,
    pub build_number: String,
    pub step_name: String,
}

impl StepLocation {
    /// Failure context for re-deriving the other links of this step.
    pub fn failure_context(&self) -> FailureContext {
        FailureContext {
            master_url: self.master_url.clone(),
            builder_name: self.builder_name.clone(),
            slave_name: String::new(),
            step_name: self.step_name.clone(),
        }
    }
}

/// Parses `<master>/builders/<builder>/builds/<n>/steps/<step>/logs/stdio`.
///
/// The builder name is form-decoded (`+` and `%XX`), since buildbot
/// quotes it in links it emits itself. Returns `None` when the URL does not
/// have that shape or a component is empty.
pub fn parse_stdio_url(url: &str) -> Option<StepLocation> {
    let rest = url.strip_suffix("/logs/stdio")?;
    let (rest, step_name) = rest.rsplit_once("/steps/")?;
    let (rest, build_number) = rest.rsplit_once("/builds/")?;
    let (master_url, raw_builder) = rest.rsplit_once("/builders/")?;

    if [master_url, raw_builder, build_number, step_name]
        .iter()
        .any(|part| part.is_empty())
    {
        return None;
    }

    let builder_name = urlencoding::decode(&raw_builder.replace('+', " "))
        .ok()?
        .into_owned();

    Some(StepLocation {
        master_url: master_url.to_string(),
        builder_name,
        build_number: build_number.to_string(),
        step_name: step_name.to_string(),
    })
}

#[cfg(test)]
mod tests;
