//! Domain models for commerce-service.

pub mod category;
pub mod dashboard;
pub mod invoice;
pub mod order;
pub mod product;
pub mod task;
pub mod user;

pub use category::{Category, CreateCategory, UpdateCategory};
pub use dashboard::{
    ActivityEntry, ActivityKind, AdminDashboard, CategoryProductCount, PlatformTotals, RecentOrder,
    RecentTask, SalesPoint, UserDashboard,
};
pub use invoice::{Invoice, InvoiceStatus, PAYMENT_TERMS_DAYS, invoice_number, payment_due_date};
pub use order::{ListOrdersFilter, Order, OrderItemRecord, OrderLine, OrderStatus, PlaceOrder};
pub use product::{CreateProduct, ListProductsFilter, Product, ProductSearch, UpdateProduct};
pub use task::{CreateTask, Task, TaskStatus, UpdateTask};
pub use user::{UpdateUserProfile, UpdateUserSettings, UserProfile, UserSettings};
