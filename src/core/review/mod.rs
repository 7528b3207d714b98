//! # Review Module
//!
//! Interactive confirmation of candidate pairs.
//!
//! A [`ReviewSession`] walks the stored pairs with a cursor that is saved
//! after every action. Each side of the pair (reference and duplicate) has
//! its own [`ReviewCache`], a three-image sliding window that loads the
//! next image in the background while the current one is on screen.
//!
//! ## Example
//! ```rust,ignore
//! let store = JsonFileStore::new("dupe_pairs_results.json");
//! let mut session = ReviewSession::open(store, Arc::new(ImageDecoder::default()))?;
//! while !session.is_complete() {
//!     let shown = session.current();
//!     // show shown.reference / shown.duplicate, then:
//!     session.confirm()?;
//! }
//! ```

mod cache;
mod loader;
mod session;

pub use cache::{ReviewCache, ReviewItem, SlotImage};
pub use loader::ImageLoader;
pub use session::{ReviewPair, ReviewSession};
