//! Three-slot sliding window over an ordered list of images.
//!
//! The window holds the images just behind, at and just ahead of the
//! current index, clamped at both ends (so the first and last positions
//! hold the same image in two slots). Moving the index answers from the
//! resident window straight away; the one image that has to enter the
//! window is loaded on a background thread, which builds the next window
//! and hands it back. The next call waits for that window before reading
//! anything, so reads never see a half-updated window.

use super::loader::ImageLoader;
use crate::error::ReviewError;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, warn};

const BEHIND: usize = 0;
const CURRENT: usize = 1;
const AHEAD: usize = 2;

/// A decoded image, or why it could not be decoded
#[derive(Debug, Clone)]
pub enum SlotImage {
    Ready(Arc<DynamicImage>),
    Failed(Arc<str>),
}

impl SlotImage {
    pub fn image(&self) -> Option<&DynamicImage> {
        match self {
            SlotImage::Ready(image) => Some(image.as_ref()),
            SlotImage::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            SlotImage::Ready(_) => None,
            SlotImage::Failed(reason) => Some(reason.as_ref()),
        }
    }
}

/// One list position as shown to the reviewer
#[derive(Debug, Clone)]
pub struct ReviewItem {
    pub index: usize,
    pub path: PathBuf,
    pub image: SlotImage,
}

impl ReviewItem {
    /// Width and height, when the image decoded
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image.image().map(|i| (i.width(), i.height()))
    }
}

#[derive(Debug, Clone)]
struct Slot {
    index: usize,
    image: SlotImage,
}

#[derive(Debug)]
struct Window {
    slots: [Slot; 3],
}

enum WindowState {
    Ready(Window),
    Sliding(JoinHandle<Window>),
    /// No usable window; rebuilt synchronously on the next read
    Stale,
}

/// Sliding-window image cache over a fixed list of paths
pub struct ReviewCache<L: ImageLoader> {
    paths: Arc<[PathBuf]>,
    index: usize,
    loader: Arc<L>,
    state: WindowState,
}

impl<L: ImageLoader> ReviewCache<L> {
    /// Build the window around `start`, loading its images before returning.
    pub fn new(paths: Vec<PathBuf>, start: usize, loader: Arc<L>) -> Result<Self, ReviewError> {
        if paths.is_empty() {
            return Err(ReviewError::Empty);
        }
        if start >= paths.len() {
            return Err(ReviewError::IndexOutOfRange {
                index: start,
                len: paths.len(),
            });
        }

        let paths: Arc<[PathBuf]> = paths.into();
        let window = build_window(loader.as_ref(), &paths, start);
        Ok(Self {
            paths,
            index: start,
            loader,
            state: WindowState::Ready(window),
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The item at the current index
    pub fn current(&mut self) -> ReviewItem {
        let window = self.take_window();
        let item = self.item(&window.slots[CURRENT]);
        self.state = WindowState::Ready(window);
        item
    }

    /// Return the current item, then move one step forward.
    ///
    /// At the last index nothing moves and the last item is returned.
    pub fn next(&mut self) -> ReviewItem {
        let window = self.take_window();
        let item = self.item(&window.slots[CURRENT]);

        if self.index + 1 >= self.paths.len() {
            self.state = WindowState::Ready(window);
            return item;
        }

        self.index += 1;
        let [evicted, behind, current] = window.slots;
        drop(evicted);

        let ahead = self.index + 1;
        self.state = if ahead >= self.paths.len() {
            WindowState::Ready(Window {
                slots: [behind, current.clone(), current],
            })
        } else {
            self.prefetch(ahead, move |ahead| Window {
                slots: [behind, current, ahead],
            })
        };
        item
    }

    /// Move one step back and return the item there.
    ///
    /// At index 0 nothing moves and the first item is returned.
    pub fn previous(&mut self) -> ReviewItem {
        let window = self.take_window();

        if self.index == 0 {
            let item = self.item(&window.slots[CURRENT]);
            self.state = WindowState::Ready(window);
            return item;
        }

        self.index -= 1;
        let [behind, current, evicted] = window.slots;
        drop(evicted);
        let item = self.item(&behind);

        self.state = if self.index == 0 {
            WindowState::Ready(Window {
                slots: [behind.clone(), behind, current],
            })
        } else {
            self.prefetch(self.index - 1, move |new_behind| Window {
                slots: [new_behind, behind, current],
            })
        };
        item
    }

    /// List indices held by the window, as (behind, current, ahead)
    pub fn window_indices(&mut self) -> [usize; 3] {
        let window = self.take_window();
        let indices = [
            window.slots[BEHIND].index,
            window.slots[CURRENT].index,
            window.slots[AHEAD].index,
        ];
        self.state = WindowState::Ready(window);
        indices
    }

    /// Distinct decoded images currently resident
    pub fn resident_images(&mut self) -> usize {
        let window = self.take_window();
        let mut seen: Vec<*const DynamicImage> = Vec::with_capacity(3);
        for slot in &window.slots {
            if let SlotImage::Ready(image) = &slot.image {
                let ptr = Arc::as_ptr(image);
                if !seen.contains(&ptr) {
                    seen.push(ptr);
                }
            }
        }
        self.state = WindowState::Ready(window);
        seen.len()
    }

    /// Wait for any in-flight load and take ownership of the window
    fn take_window(&mut self) -> Window {
        match std::mem::replace(&mut self.state, WindowState::Stale) {
            WindowState::Ready(window) => window,
            WindowState::Sliding(handle) => match handle.join() {
                Ok(window) => window,
                Err(_) => {
                    error!(index = self.index, "image prefetch panicked; reloading window");
                    build_window(self.loader.as_ref(), &self.paths, self.index)
                }
            },
            WindowState::Stale => build_window(self.loader.as_ref(), &self.paths, self.index),
        }
    }

    fn prefetch<F>(&self, index: usize, assemble: F) -> WindowState
    where
        F: FnOnce(Slot) -> Window + Send + 'static,
    {
        let loader = Arc::clone(&self.loader);
        let paths = Arc::clone(&self.paths);

        let spawned = thread::Builder::new()
            .name("review-prefetch".to_string())
            .spawn(move || assemble(load_slot(loader.as_ref(), &paths, index)));

        match spawned {
            Ok(handle) => WindowState::Sliding(handle),
            Err(e) => {
                warn!(error = %e, "could not start image prefetch; loading on demand");
                WindowState::Stale
            }
        }
    }

    fn item(&self, slot: &Slot) -> ReviewItem {
        ReviewItem {
            index: slot.index,
            path: self.paths[slot.index].clone(),
            image: slot.image.clone(),
        }
    }
}

fn load_slot<L: ImageLoader + ?Sized>(loader: &L, paths: &[PathBuf], index: usize) -> Slot {
    let path: &Path = &paths[index];
    let image = match loader.load(path) {
        Ok(image) => {
            debug!(index, path = %path.display(), "image loaded");
            SlotImage::Ready(Arc::new(image))
        }
        Err(e) => {
            warn!(index, path = %path.display(), error = %e, "image could not be loaded");
            SlotImage::Failed(e.to_string().into())
        }
    };
    Slot { index, image }
}

/// Window centred on `index`; clamped positions share the centre's image
fn build_window<L: ImageLoader + ?Sized>(loader: &L, paths: &[PathBuf], index: usize) -> Window {
    let current = load_slot(loader, paths, index);
    let behind = if index == 0 {
        current.clone()
    } else {
        load_slot(loader, paths, index - 1)
    };
    let ahead = if index + 1 >= paths.len() {
        current.clone()
    } else {
        load_slot(loader, paths, index + 1)
    };
    Window {
        slots: [behind, current, ahead],
    }
}
