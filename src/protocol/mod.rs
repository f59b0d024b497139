//! Typed payload decoders/encoders for every packet this core sends or
//! receives, plus the capability/status/type-id vocabulary they share.

pub mod auth;
pub mod auth_switch;
pub mod capabilities;
pub mod column_def;
pub mod column_type;
pub mod command;
pub mod eof;
pub mod err;
pub mod handshake;
pub mod handshake_response;
pub mod ok;
pub mod response;
pub mod ssl_request;
pub mod status;

pub use capabilities::Capabilities;
pub use column_def::ColumnDefinition;
pub use column_type::{ColumnType, FieldFlags, CHARSET_BINARY};
pub use handshake::{AuthPlugin, Handshake};
pub use response::GenericResponse;
pub use status::Status;
