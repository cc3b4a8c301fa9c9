pub mod inventory;
pub mod models;

pub use models::employee::Employee;

#[cfg(test)]
mod tests {
    pub struct Employee {
        pub fixture: bool,
    }
}
