mod locations;
mod outcomes;
mod records;
mod session;

pub use locations::*;
pub use outcomes::*;
pub use records::*;
pub use session::*;

use serde::Serialize;

/// TemplateVariable describes one variable available to config templates
#[derive(Debug, Clone, Serialize)]
pub struct TemplateVariable {
    pub name: String,
    pub description: String,
    pub example: String,
}

/// A device model offered by the form and whether its template file exists
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub template: String,
    pub template_available: bool,
}
