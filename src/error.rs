use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinksError {
    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("Master not found: {0}")]
    MasterNotFound(String),

    #[error("Duplicate repository name: {0}")]
    DuplicateRepository(String),

    #[error("Duplicate master URL path segment: {0}")]
    DuplicateMaster(String),

    #[error(
        "Invalid {kind} template for repository {repository}: expected {expected} placeholder(s), found {found}"
    )]
    InvalidTemplate {
        repository: String,
        kind: &'static str,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, LinksError>;
