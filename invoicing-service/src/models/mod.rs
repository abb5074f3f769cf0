//! Domain models for invoicing-service.

mod invoice;
mod lenient;
mod line_item;
mod user;

pub use invoice::{Invoice, InvoiceFields, Party};
pub use line_item::{LineItem, DEFAULT_GST_PERCENT};
pub use user::UserRecord;
