//! Link and label helpers for a buildbot CI status dashboard.
//!
//! [`Registry`] maps repository names and master URL segments to their
//! metadata; [`LinkFormatter`] turns that plus per-failure data into the
//! URLs and labels shown in the failure tables.

pub mod config;
pub mod display;
pub mod error;
pub mod links;
pub mod registry;
mod template;

pub use config::Config;
pub use display::{compact_ranges, falsy_to_empty, since_string, since_string_at, Falsy};
pub use error::{LinksError, Result};
pub use links::{
    build_url, builder_url, master_url_path_segment, parse_stdio_url, short_master_name,
    slave_url, stdio_url, step_url, FailureContext, FlakinessAddressing, FormatterOptions,
    LinkFormatter, MissingMasterLabel, StepLocation,
};
pub use registry::{MasterRecord, Registry, RepositoryRecord};
