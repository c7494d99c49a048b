//! Repository, request validation and the query-runner seam.

pub mod pagination;
pub mod repository;
pub mod runner;
mod validation;

pub use pagination::Pagination;
pub use repository::{dependency_message, DeleteOutcome, Page, Repository};
pub use runner::{GuardedDelete, NamedQuery, PgRunner, QueryRunner};
pub use validation::RequestValidator;
