use serde::{Deserialize, Serialize};

/// Organization identity stamped onto exported documents
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CompanyInfo {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    /// Logo URL, if the organization uploaded one
    #[serde(default)]
    pub logo: Option<String>,
}

impl CompanyInfo {
    /// Record used whenever the settings endpoint cannot be reached
    pub fn fallback() -> Self {
        Self {
            name: "Property Management".to_string(),
            email: "info@propertymanagement.co.ke".to_string(),
            phone: "+254 700 000 000".to_string(),
            address: "Nairobi, Kenya".to_string(),
            logo: None,
        }
    }

    /// Non-empty address, "Tel: phone" and "Email: email" joined by " | "
    pub fn contact_line(&self) -> String {
        let mut parts = Vec::new();
        if !self.address.trim().is_empty() {
            parts.push(self.address.trim().to_string());
        }
        if !self.phone.trim().is_empty() {
            parts.push(format!("Tel: {}", self.phone.trim()));
        }
        if !self.email.trim().is_empty() {
            parts.push(format!("Email: {}", self.email.trim()));
        }
        parts.join(" | ")
    }

    pub fn logo_url(&self) -> Option<&str> {
        self.logo
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}
