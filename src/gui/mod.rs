//! iced front-end.
//!
//! - `app` - application struct, top-level update/view and launch
//! - `message` - top-level messages
//! - `state` - state shared by all screens
//! - `screens/` - preview, parameters and command screens
//! - `widgets` - layout helpers

mod app;
mod message;
mod screens;
mod state;
mod widgets;

pub use app::{RegistrationApp, run};
pub use message::Message;
pub use state::{AppState, LaunchOptions};
