pub mod employee;
pub mod page;
pub mod person;

pub use page::Page;
