pub mod blob_store;
pub mod busy;
pub mod notification;
pub mod profile;
pub mod profile_store;
pub mod profile_view;
