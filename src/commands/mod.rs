//! CLI commands implementation

pub mod find_endpoint;
pub mod index;
pub mod init;
pub mod list;
pub mod recommend;
pub mod search;
pub mod show;
pub mod status;

pub use find_endpoint::*;
pub use index::*;
pub use init::*;
pub use list::*;
pub use recommend::*;
pub use search::*;
pub use show::*;
pub use status::*;
