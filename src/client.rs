//! Client side of the catalog: an HTTP API client, an explicit reducer-style
//! state value, a store that drives the two, and the view models the product
//! screens render from.

pub mod api;
pub mod state;
pub mod store;
pub mod view;

pub use api::{ClientError, HttpProductApi, ImageUpload, ProductApi, ProductSubmission};
pub use state::{ListTicket, Notice, ProductsState};
pub use store::ProductStore;
