//! Bounded product collections: wishlist, compare list, recently viewed.

mod compare;
mod recent;
mod wishlist;

pub use compare::{CompareList, COMPARE_CAPACITY};
pub use recent::RecentlyViewed;
pub use wishlist::Wishlist;
