//! Page objects for the storefront screens.

pub mod home;
pub mod login;

pub use home::{HomePage, ProductCard, SortOption};
pub use login::LoginPage;
