pub mod collection;
pub mod composer;
pub mod dispatch;
pub mod groups;
pub mod session;
pub mod status;
pub mod templates;
