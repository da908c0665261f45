use serde::{Deserialize, Serialize};

use crate::branding::CachedCompany;
use crate::report::ReportStore;

/// State carried between invocations: the report store and the branding cache entry
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Session {
    #[serde(default)]
    pub store: ReportStore,
    #[serde(default)]
    pub branding: Option<CachedCompany>,
}
