pub mod db;
pub mod push;

pub use db::DbAdapter;
pub use push::{DisabledPushAdapter, WebPushAdapter};
