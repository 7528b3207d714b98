//! # Events Module
//!
//! Progress reporting decoupled from the data path.
//!
//! ## Design
//! Pipeline phases emit events through a channel; any observer (terminal
//! progress bar, log, test harness) can subscribe. Dropping the receiver
//! never changes what the pipeline produces.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Ingest(IngestEvent::Progress(p)) = event {
//!             println!("Read {}/{}", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! pipeline.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender, Received};
pub use types::*;
