mod daily;
mod post;
mod role;
mod user;

pub use daily::*;
pub use post::*;
pub use role::*;
pub use user::*;
