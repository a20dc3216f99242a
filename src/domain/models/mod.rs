mod action;
mod auth;
mod backend;
mod chunk;
mod dcf;
mod document;
mod event;
mod loading;
mod message;
mod parameter;
mod project;
mod session;
mod slash_commands;
mod statement;
mod table;
mod textarea;

pub use action::*;
pub use auth::*;
pub use backend::*;
pub use chunk::*;
pub use dcf::*;
pub use document::*;
pub use event::*;
pub use loading::*;
pub use message::*;
pub use parameter::*;
pub use project::*;
pub use session::*;
pub use slash_commands::*;
pub use statement::*;
pub use table::*;
pub use textarea::*;
