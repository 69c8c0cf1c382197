pub mod session;

pub use session::{BrowserKind, BrowserSession, GridConfig, SessionConfig};
