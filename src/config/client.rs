use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Client {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}
