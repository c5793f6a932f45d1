mod category;
mod history;

pub use category::{HomeCategory, HOME_CATEGORIES};
pub use history::WatchEntry;
