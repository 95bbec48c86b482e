//! # chnative-testing
//!
//! Test infrastructure for ClickHouse native protocol response processing.
//!
//! No server is needed: a test scripts the server's side of the response
//! stream with [`ServerScript`], feeds it to the client through an in-memory
//! duplex pipe, and inspects what the client read and wrote through the
//! [`Recording`] handle of a [`RecordingStream`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use chnative_testing::{MockServer, ServerScript, fixtures};
//!
//! #[tokio::test]
//! async fn test_first_block() {
//!     let (stream, recording, mut server) = MockServer::pair();
//!     server
//!         .send(ServerScript::new().data(&fixtures::rows_block(3)).end_of_stream())
//!         .await;
//!
//!     let mut conn = Connection::new(stream, Config::default()).unwrap();
//!     // ...
//!     assert!(recording.written().is_empty());
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod fixtures;
pub mod mock_server;
pub mod recording;
pub mod script;

pub use mock_server::{MockServer, init_tracing};
pub use recording::{ReadRecord, Recording, RecordingStream};
pub use script::ServerScript;
