//! The two function entry points.
//!
//! Each handler runs one sequential pass over its collaborators per
//! invocation. Collaborators are injected so one set of clients is shared by
//! every invocation a warm process serves.

pub mod lookup;
pub mod notify;

pub use lookup::WeatherLookup;
pub use notify::NotificationDispatcher;
