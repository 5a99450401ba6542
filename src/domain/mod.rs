mod currency;
mod money;
mod page;
mod price;
mod product;

pub use currency::*;
pub use money::*;
pub use page::*;
pub use price::*;
pub use product::*;
