// src/acquisition/mod.rs
//! Signal acquisition and buffering components

pub mod handoff;
pub mod line_parser;
pub mod ring_buffer;
pub mod sample_sync;

pub use handoff::{sample_channel, SampleReceiver, SampleSender};
pub use line_parser::{LineParser, LineParserConfig, ParseError};
pub use ring_buffer::{RingBufferError, SampleWindow};
pub use sample_sync::{SampleSynchronizer, SyncStats, SyncedSample};
