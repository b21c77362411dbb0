//! Component storage.
//!
//! - `Component`: a concrete type held in the store
//! - `ComponentStore`: the multiset of held components
//! - `Reader`: read-only evaluation of counts, requirements and metrics
//! - `Limiter`: count-bound arithmetic for changes

pub mod component;
pub mod store;
pub mod reader;
pub mod limiter;

pub use component::Component;
pub use store::ComponentStore;
pub use reader::Reader;
pub use limiter::Limiter;
