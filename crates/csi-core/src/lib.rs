pub mod error;
pub mod id;
pub mod model;
pub mod time;

pub use error::{CoreError, Result};
pub use id::generate_id;
pub use model::{
    validate_canonical_url, validate_code, CodeSystemRef, ImportedConcept, ImportedProperty,
    PropertyDef,
};
pub use time::now_utc;
