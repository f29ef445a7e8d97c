pub mod cart_items;
pub mod line_items;
pub mod products;
pub mod transactions;
pub mod users;

pub use cart_items::Entity as CartItems;
pub use line_items::Entity as LineItems;
pub use products::Entity as Products;
pub use transactions::Entity as Transactions;
pub use users::Entity as Users;
