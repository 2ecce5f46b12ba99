//! External operation seam for `CodeSystem/$import`.
//!
//! Everything surrounding the import engine itself — HTTP routing, auth,
//! request marshalling — is an external collaborator; this crate specifies
//! only the seam: an [`OperationHandler`] trait and the concrete
//! [`ImportOperation`] that parses input parameters and drives
//! `csi_db_postgres::import_code_system`.

pub mod error;
pub mod handler;

pub use error::OperationError;
pub use handler::{ImportOperation, OperationHandler};
