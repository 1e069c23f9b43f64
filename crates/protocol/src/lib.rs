//! Wire protocol for the livechat event stream.
//!
//! Every frame is a JSON object of the form `{ "type": <kind>, "data": <payload> }`.
//! Frames that are not JSON at all are surfaced as plain text so that a bare
//! echo endpoint still produces something readable.

pub mod constants;
pub mod envelope;
pub mod messages;
pub mod timestamp;

pub use constants::EventKind;
pub use envelope::{InboundFrame, ProtocolError, WsEvent, decode_frame};
pub use messages::{ConnectionData, ErrorData, MessageData, SenderKind, UserListData};
