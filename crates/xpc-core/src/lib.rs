pub mod constants;
pub mod encode;
pub mod error;
pub mod params;
pub mod script;
pub mod transaction;
pub mod types;

pub use constants::*;
pub use error::{ErrorClass, XpcError};
pub use params::{ConsensusParams, Network};
pub use script::{Destination, Script, ScriptClass};
pub use transaction::*;
pub use types::*;
