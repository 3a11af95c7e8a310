pub mod customer;
pub mod invoice;
pub mod line_item;
pub mod payment;
pub mod vendor;

pub use customer::Customer;
pub use invoice::{Invoice, InvoiceStatus};
pub use line_item::LineItem;
pub use payment::Payment;
pub use vendor::Vendor;
