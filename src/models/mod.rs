//! Data models for receiptfold.

mod extraction;
mod notification;
mod receipt;
mod request;
mod shopping_list;

pub use extraction::StoreBundle;
pub use notification::{NotificationData, NotificationEvent, LIST_UPDATE_TYPE};
pub use receipt::ReceiptRecord;
pub use request::AnalysisRequest;
pub use shopping_list::ShoppingList;
