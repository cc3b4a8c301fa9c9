use serde::{Deserialize, Serialize};

/// Someone known to the directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    #[validate(range(max = 150))]
    pub age: u8,
}
