use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indexmap::IndexMap;
use log::info;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use buildlinks::{
    build_url, builder_url, master_url_path_segment, parse_stdio_url, since_string, slave_url,
    stdio_url, step_url, Config, FailureContext, FlakinessAddressing, LinkFormatter,
};

use crate::output;

#[derive(Parser)]
#[command(name = "buildlinks")]
#[command(author, version, about = "Buildbot dashboard link helper", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./buildlinks.{toml,json,yaml,yml})
    #[arg(short, long, global = true, env = "BUILDLINKS_CONFIG")]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(short, long, global = true, default_value_t = false)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Addressing {
    Master,
    Group,
}

impl From<Addressing> for FlakinessAddressing {
    fn from(value: Addressing) -> Self {
        match value {
            Addressing::Master => FlakinessAddressing::Master,
            Addressing::Group => FlakinessAddressing::Group,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Link to a single revision
    Change { repo: String, revision: String },

    /// Link to the changelog between two revisions
    Changelog {
        repo: String,
        start: String,
        end: String,
    },

    /// Buildbot links for a builder, build and step
    Build {
        #[arg(short, long)]
        master_url: String,

        #[arg(short, long)]
        builder: String,

        #[arg(short = 'n', long)]
        build_number: Option<u64>,

        #[arg(short, long)]
        slave: Option<String>,

        #[arg(long)]
        step: Option<String>,
    },

    /// Flakiness dashboard link for a failing test
    Flakiness {
        #[arg(short, long)]
        test: Option<String>,

        #[arg(short, long)]
        step: String,

        #[arg(short, long)]
        master_url: String,

        #[arg(short, long, value_enum)]
        addressing: Option<Addressing>,
    },

    /// Path segment, label and group of a master URL
    Master { master_url: String },

    /// Decode a step stdio log URL
    ParseLog { url: String },

    /// Revisions of tracked repositories in a buildbot build JSON file
    Revisions { build_json: PathBuf },

    /// Humanized age of a buildbot timestamp
    Since { epoch_seconds: f64 },

    /// List known repositories
    Repos,

    /// List known masters
    Masters,

    /// Write the effective configuration, including both tables, to a file
    InitConfig { path: PathBuf },
}

impl Cli {
    fn formatter(&self, addressing: Option<Addressing>) -> Result<LinkFormatter> {
        let config = Config::load(self.config.as_deref())?;
        let registry = config.registry()?;

        let mut options = config.formatter;
        if let Some(addressing) = addressing {
            options.flakiness_addressing = addressing.into();
        }

        Ok(LinkFormatter::new(Arc::new(registry), options))
    }

    fn emit<K>(&self, links: Vec<(K, String)>) -> Result<()>
    where
        K: AsRef<str> + Serialize + Hash + Eq,
    {
        if self.json {
            let map: IndexMap<K, String> = links.into_iter().collect();
            println!("{}", serde_json::to_string_pretty(&map)?);
        } else {
            output::print_links(&links);
        }
        Ok(())
    }

    fn execute_build(
        &self,
        master_url: &str,
        builder: &str,
        build_number: Option<u64>,
        slave: Option<&str>,
        step: Option<&str>,
    ) -> Result<()> {
        validate_master_url(master_url)?;

        let failure = FailureContext {
            master_url: master_url.trim_end_matches('/').to_string(),
            builder_name: builder.to_string(),
            slave_name: slave.unwrap_or_default().to_string(),
            step_name: step.unwrap_or_default().to_string(),
        };

        let mut links = vec![("builder", builder_url(&failure))];
        if slave.is_some() {
            links.push(("slave", slave_url(&failure)));
        }
        if let Some(number) = build_number {
            links.push(("build", build_url(&failure, number)));
            if step.is_some() {
                links.push(("step", step_url(&failure, number)));
                links.push(("stdio", stdio_url(&failure, number)));
            }
        }

        self.emit(links)
    }

    fn execute_master(&self, master_url: &str) -> Result<()> {
        validate_master_url(master_url)?;
        let formatter = self.formatter(None)?;

        let mut links = vec![
            ("segment", master_url_path_segment(master_url).to_string()),
            (
                "label",
                formatter
                    .master_display_name(Some(master_url))
                    .unwrap_or_default(),
            ),
        ];
        if let Some(group) = formatter.group_for_master(master_url) {
            links.push(("group", group.to_string()));
        }

        self.emit(links)
    }

    fn execute_revisions(&self, build_json: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(build_json)
            .with_context(|| format!("Failed to read build file: {}", build_json.display()))?;
        let build: Value = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse build JSON: {}", build_json.display()))?;

        let properties = build
            .get("properties")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let formatter = self.formatter(None)?;
        let links: Vec<(String, String)> = formatter
            .registry()
            .revisions_from_properties(properties)
            .into_iter()
            .filter_map(|(repo, revision)| {
                let revision = revision?;
                let url = formatter.change_url(&repo, &revision).ok()?;
                Some((repo, format!("{revision} {url}")))
            })
            .collect();

        self.emit(links)
    }

    pub fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Change { repo, revision } => {
                let url = self.formatter(None)?.change_url(repo, revision)?;
                self.emit(vec![("change", url)])
            }
            Commands::Changelog { repo, start, end } => {
                let url = self.formatter(None)?.changelog_url(repo, start, end)?;
                self.emit(vec![("log", url)])
            }
            Commands::Build {
                master_url,
                builder,
                build_number,
                slave,
                step,
            } => self.execute_build(
                master_url,
                builder,
                *build_number,
                slave.as_deref(),
                step.as_deref(),
            ),
            Commands::Flakiness {
                test,
                step,
                master_url,
                addressing,
            } => {
                validate_master_url(master_url)?;
                let url = self.formatter(*addressing)?.flakiness_dashboard_url(
                    test.as_deref(),
                    step,
                    master_url,
                );
                if url.is_empty() {
                    info!("No flakiness dashboard for step '{step}'");
                }
                self.emit(vec![("flakiness", url)])
            }
            Commands::Master { master_url } => self.execute_master(master_url),
            Commands::ParseLog { url } => {
                let location = parse_stdio_url(url)
                    .with_context(|| format!("Not a step stdio URL: {url}"))?;
                self.emit(vec![
                    ("master", location.master_url),
                    ("builder", location.builder_name),
                    ("build", location.build_number),
                    ("step", location.step_name),
                ])
            }
            Commands::Revisions { build_json } => self.execute_revisions(build_json),
            Commands::Since { epoch_seconds } => {
                self.emit(vec![("since", since_string(*epoch_seconds))])
            }
            Commands::Repos => {
                let formatter = self.formatter(None)?;
                if self.json {
                    let repos: Vec<_> = formatter.registry().repositories().collect();
                    println!("{}", serde_json::to_string_pretty(&repos)?);
                } else {
                    println!("{}", output::repositories_table(formatter.registry()));
                }
                Ok(())
            }
            Commands::InitConfig { path } => {
                let config = Config::load(self.config.as_deref())?;
                config.effective()?.save(path)?;
                info!("Configuration written to: {}", path.display());
                Ok(())
            }
            Commands::Masters => {
                let formatter = self.formatter(None)?;
                if self.json {
                    let masters: Vec<_> = formatter.registry().masters().collect();
                    println!("{}", serde_json::to_string_pretty(&masters)?);
                } else {
                    println!("{}", output::masters_table(formatter.registry()));
                }
                Ok(())
            }
        }
    }
}

fn validate_master_url(master_url: &str) -> Result<()> {
    Url::parse(master_url).with_context(|| format!("Invalid master URL: {master_url}"))?;
    Ok(())
}
