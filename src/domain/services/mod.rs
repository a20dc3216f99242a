pub mod actions;
mod app_state;
mod auth_services;
mod bubble;
mod bubble_list;
pub mod events;
mod scroll;
mod stream_assembler;

pub use app_state::*;
pub use auth_services::*;
pub use bubble::*;
pub use bubble_list::*;
pub use scroll::*;
pub use stream_assembler::*;
