pub mod amount;
pub mod cell;
pub mod credentials;
pub mod errors;
pub mod key;
pub mod lesson;
pub mod private;
pub mod range;
pub mod row;
pub mod session;
