use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LinksError, Result};
use crate::template;

/// A source repository whose revisions appear in build properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepositoryRecord {
    /// Unique, case-sensitive identifier (e.g. "chromium")
    pub name: String,

    /// Compact alias for narrow table columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,

    /// Single-revision page, exactly one `%s`
    pub change_url: String,

    /// Changelog range page, exactly two `%s` (start, then end)
    pub changelog_url: String,

    /// Buildbot property carrying this repository's revision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_property: Option<String>,
}

/// A build master and the tree groups it reports into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MasterRecord {
    pub display_name: String,
    pub url_path_segment: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl MasterRecord {
    /// Only the first group is ever used for addressing.
    pub fn primary_group(&self) -> Option<&str> {
        self.groups.first().map(String::as_str)
    }
}

/// Read-only lookup tables for repositories and build masters.
///
/// Built once and shared (usually behind an `Arc`) by every formatter.
/// Entries keep their insertion order, which is also the order used when
/// listing or extracting revisions.
#[derive(Debug, Clone)]
pub struct Registry {
    repositories: IndexMap<String, RepositoryRecord>,
    masters: IndexMap<String, MasterRecord>,
}

impl Registry {
    /// Builds a registry from caller-supplied tables.
    ///
    /// # Errors
    ///
    /// Returns an error if a repository name or master path segment is
    /// repeated, or if a template does not carry the expected number of
    /// `%s` placeholders (one for change URLs, two for changelog URLs).
    pub fn new(repositories: Vec<RepositoryRecord>, masters: Vec<MasterRecord>) -> Result<Self> {
        let mut repo_map = IndexMap::with_capacity(repositories.len());
        for repo in repositories {
            validate_template(&repo.name, "change", &repo.change_url, 1)?;
            validate_template(&repo.name, "changelog", &repo.changelog_url, 2)?;
            if repo_map.contains_key(&repo.name) {
                return Err(LinksError::DuplicateRepository(repo.name));
            }
            repo_map.insert(repo.name.clone(), repo);
        }

        let mut master_map = IndexMap::with_capacity(masters.len());
        for master in masters {
            if master_map.contains_key(&master.url_path_segment) {
                return Err(LinksError::DuplicateMaster(master.url_path_segment));
            }
            master_map.insert(master.url_path_segment.clone(), master);
        }

        debug!(
            "Registry loaded with {} repositories and {} masters",
            repo_map.len(),
            master_map.len()
        );

        Ok(Self {
            repositories: repo_map,
            masters: master_map,
        })
    }

    /// The tables shipped with the dashboard.
    pub fn builtin() -> Self {
        let repositories = builtin_repositories()
            .into_iter()
            .map(|repo| (repo.name.clone(), repo))
            .collect();
        let masters = builtin_masters()
            .into_iter()
            .map(|master| (master.url_path_segment.clone(), master))
            .collect();

        Self {
            repositories,
            masters,
        }
    }

    /// Repositories in table order.
    pub fn repositories(&self) -> impl Iterator<Item = &RepositoryRecord> {
        self.repositories.values()
    }

    /// Masters in table order.
    pub fn masters(&self) -> impl Iterator<Item = &MasterRecord> {
        self.masters.values()
    }

    /// Exact, case-sensitive lookup by repository name.
    ///
    /// # Errors
    ///
    /// Returns [`LinksError::RepositoryNotFound`] when no entry matches.
    pub fn find_repository(&self, name: &str) -> Result<&RepositoryRecord> {
        self.repositories
            .get(name)
            .ok_or_else(|| LinksError::RepositoryNotFound(name.to_string()))
    }

    /// Exact lookup by the master's URL path segment (e.g. "chromium.win").
    ///
    /// # Errors
    ///
    /// Returns [`LinksError::MasterNotFound`] when no entry matches.
    pub fn find_master_by_segment(&self, segment: &str) -> Result<&MasterRecord> {
        self.masters
            .get(segment)
            .ok_or_else(|| LinksError::MasterNotFound(segment.to_string()))
    }

    /// URL of a single revision in `repo_name`.
    ///
    /// # Arguments
    ///
    /// * `repo_name` - Registered repository name (e.g., "chromium")
    /// * `revision` - Revision to link (e.g., "281989")
    ///
    /// # Returns
    ///
    /// The change page (e.g., <http://crrev.com/281989>)
    ///
    /// # Errors
    ///
    /// Returns an error if the repository is not registered.
    pub fn change_url(&self, repo_name: &str, revision: &str) -> Result<String> {
        let repo = self.find_repository(repo_name)?;
        Ok(template::fill(&repo.change_url, &[revision]))
    }

    /// URL of the changelog between `start` and `end`.
    ///
    /// The first placeholder always receives `start` and the second `end`.
    /// Nothing checks that `start` precedes `end`.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository is not registered.
    pub fn changelog_url(&self, repo_name: &str, start: &str, end: &str) -> Result<String> {
        let repo = self.find_repository(repo_name)?;
        Ok(template::fill(&repo.changelog_url, &[start, end]))
    }

    /// Compact alias for display, `None` when the repository has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository is not registered.
    pub fn short_name(&self, repo_name: &str) -> Result<Option<&str>> {
        Ok(self.find_repository(repo_name)?.short_name.as_deref())
    }

    /// Extracts the revision of every tracked repository from buildbot
    /// build properties (`[name, value, source]` tuples).
    ///
    /// Tester builders report stale `got_*` values, so `parent_<property>`
    /// wins whenever it is present and non-empty.
    pub fn revisions_from_properties(
        &self,
        properties: &[Value],
    ) -> IndexMap<String, Option<String>> {
        self.repositories()
            .filter_map(|repo| {
                let property = repo.revision_property.as_deref()?;
                let revision = property_value(properties, &format!("parent_{property}"))
                    .or_else(|| property_value(properties, property));
                Some((repo.name.clone(), revision))
            })
            .collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_template(
    repository: &str,
    kind: &'static str,
    url: &str,
    expected: usize,
) -> Result<()> {
    let found = template::placeholder_count(url);
    if found != expected {
        return Err(LinksError::InvalidTemplate {
            repository: repository.to_string(),
            kind,
            expected,
            found,
        });
    }
    Ok(())
}

fn property_value(properties: &[Value], name: &str) -> Option<String> {
    let value = properties
        .iter()
        .filter_map(Value::as_array)
        .find(|tuple| tuple.first().and_then(Value::as_str) == Some(name))?
        .get(1)?;

    let revision = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    (!revision.is_empty()).then_some(revision)
}

struct BuiltinRepository {
    name: &'static str,
    short_name: Option<&'static str>,
    change_url: &'static str,
    changelog_url: &'static str,
    revision_property: Option<&'static str>,
}

const BUILTIN_REPOSITORIES: &[BuiltinRepository] = &[
    BuiltinRepository {
        name: "chromium",
        short_name: Some("cr"),
        change_url: "http://crrev.com/%s",
        changelog_url: "http://build.chromium.org/f/chromium/perf/dashboard/ui/changelog.html?url=/trunk&range=%s:%s",
        revision_property: Some("got_revision"),
    },
    BuiltinRepository {
        name: "blink",
        short_name: Some("bl"),
        change_url: "https://src.chromium.org/viewvc/blink?view=revision&revision=%s",
        changelog_url: "http://build.chromium.org/f/chromium/perf/dashboard/ui/changelog_blink.html?url=/trunk&range=%s:%s",
        revision_property: Some("got_webkit_revision"),
    },
    BuiltinRepository {
        name: "v8",
        short_name: None,
        change_url: "https://code.google.com/p/v8/source/detail?r=%s",
        changelog_url: "http://build.chromium.org/f/chromium/perf/dashboard/ui/changelog_v8.html?url=/trunk&range=%s:%s",
        revision_property: Some("got_v8_revision"),
    },
    BuiltinRepository {
        name: "nacl",
        short_name: None,
        change_url: "https://src.chromium.org/viewvc/native_client?view=revision&revision=%s",
        changelog_url: "http://build.chromium.org/f/chromium/perf/dashboard/ui/changelog_nacl.html?url=/trunk&range=%s:%s",
        revision_property: Some("got_nacl_revision"),
    },
    // Skia revisions are not exposed in buildbot properties.
    BuiltinRepository {
        name: "skia",
        short_name: Some("sk"),
        change_url: "https://code.google.com/p/skia/source/detail?r=%s",
        changelog_url: "http://build.chromium.org/f/chromium/perf/dashboard/ui/changelog_skia.html?url=/trunk&range=%s:%s",
        revision_property: None,
    },
];

const BUILTIN_MASTERS: &[(&str, &str, &[&str])] = &[
    ("ChromiumWin", "chromium.win", &["@ToT Chromium"]),
    ("ChromiumMac", "chromium.mac", &["@ToT Chromium"]),
    ("ChromiumLinux", "chromium.linux", &["@ToT Chromium"]),
    ("ChromiumChromiumOS", "chromium.chromiumos", &["@ToT ChromeOS"]),
    ("ChromiumGPU", "chromium.gpu", &["@ToT Chromium"]),
    ("ChromiumGPUFYI", "chromium.gpu.fyi", &["@ToT Chromium FYI"]),
    ("ChromiumWebkit", "chromium.webkit", &["@ToT Chromium", "@ToT Blink"]),
    ("ChromiumFYI", "chromium.fyi", &["@ToT Chromium FYI"]),
    ("ChromiumMemory", "chromium.memory", &["@ToT Chromium"]),
    ("V8", "client.v8", &["@ToT V8"]),
    ("WebkitBlink", "chromium.webkit.blink", &["@ToT Blink"]),
    ("TryServerChromiumGPU", "tryserver.chromium.gpu", &["TryServers"]),
];

/// Built-in repository table as owned records.
pub fn builtin_repositories() -> Vec<RepositoryRecord> {
    BUILTIN_REPOSITORIES
        .iter()
        .map(|repo| RepositoryRecord {
            name: repo.name.to_string(),
            short_name: repo.short_name.map(str::to_string),
            change_url: repo.change_url.to_string(),
            changelog_url: repo.changelog_url.to_string(),
            revision_property: repo.revision_property.map(str::to_string),
        })
        .collect()
}

/// Built-in master table as owned records.
pub fn builtin_masters() -> Vec<MasterRecord> {
    BUILTIN_MASTERS
        .iter()
        .map(|(display_name, segment, groups)| MasterRecord {
            display_name: (*display_name).to_string(),
            url_path_segment: (*segment).to_string(),
            groups: groups.iter().map(|g| (*g).to_string()).collect(),
        })
        .collect()
}
