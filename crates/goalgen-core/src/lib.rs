pub mod diagnostic;
pub mod error;
pub mod fingerprint;
pub mod generate;
pub mod io;
pub mod lock;
pub mod manifest;
pub mod paths;
pub mod regen;
pub mod spec;
pub mod template;
pub mod validator;

pub use error::{GoalgenError, Result};
