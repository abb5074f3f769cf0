//! Services module for invoicing-service.

pub mod error;
pub mod identity;
pub mod invoices;
pub mod jwt;
pub mod metrics;
pub mod store;
pub mod totals;

pub use error::ServiceError;
pub use identity::{AuthTokens, IdentityProvider, LocalIdentityProvider, VerifiedIdentity};
pub use invoices::{InvoiceService, InvoiceSummary};
pub use jwt::JwtService;
pub use metrics::{get_metrics, init_metrics};
pub use store::{InvoiceStore, MemoryStore, PostgresStore};
pub use totals::{invoice_totals, line_totals, InvoiceTotals, LineTotals};
