//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for the write operations on that entity
//! - `Serialize` response DTOs where the wire shape differs from the row

pub mod page;
pub mod page_version;
