//! # medlink-core
//!
//! Domain values shared by every Medlink crate:
//!
//! - [`Patient`]: a tenant-scoped demographic record as the store returns it
//! - [`PatientProfile`]: the demographic fields without identity or tenant,
//!   as an external HIS supplies them
//! - [`SearchCriteria`]: normalized, optional filter fields
//! - [`RawSearchCriteria`]: the criteria exactly as a caller sent them
//!
//! Blank and whitespace-only strings are never stored in any of these
//! normalized types; see [`normalize`].

pub mod criteria;
pub mod date;
pub mod error;
pub mod normalize;
pub mod patient;

pub use criteria::{RawSearchCriteria, SearchCriteria};
pub use date::{format_iso_date, parse_iso_date, parse_iso_date_lenient};
pub use error::{CoreError, Result};
pub use normalize::{is_blank, normalize, normalize_field, normalize_str};
pub use patient::{Patient, PatientProfile};
