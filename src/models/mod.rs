pub mod alert;
pub mod appointment;
pub mod enums;
pub mod hygiene;
pub mod lab;
pub mod lenient;
pub mod worker;

pub use alert::*;
pub use appointment::*;
pub use hygiene::*;
pub use lab::*;
pub use worker::*;
