pub mod audit_logs;
pub mod basket_items;
pub mod brands;
pub mod categories;
pub mod email_verifications;
pub mod favorites;
pub mod order_items;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reviews;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use basket_items::Entity as BasketItems;
pub use brands::Entity as Brands;
pub use categories::Entity as Categories;
pub use email_verifications::Entity as EmailVerifications;
pub use favorites::Entity as Favorites;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use payments::Entity as Payments;
pub use products::Entity as Products;
pub use reviews::Entity as Reviews;
pub use users::Entity as Users;
