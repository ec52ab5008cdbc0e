pub mod profile;

pub use profile::{ReadingLevel, UserProfile};
